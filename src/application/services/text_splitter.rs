pub trait RecursiveTextSplitter {
    fn split_text<'a>(&self, text: &'a str, max_chunk_size: usize) -> Chunks<'a>;
}

const DEFAULT_SEPARATORS: &[&str] = &[
    "\n\n", // paragraphs
    "\n",   // lines
    ". ",   // sentences
    " ",    // words
];

#[derive(Debug, Clone)]
pub struct RTSplitter {
    separators: &'static [&'static str],
}

impl Default for RTSplitter {
    fn default() -> Self {
        Self {
            separators: DEFAULT_SEPARATORS,
        }
    }
}

impl RecursiveTextSplitter for RTSplitter {
    fn split_text<'a>(&self, text: &'a str, max_chunk_size: usize) -> Chunks<'a> {
        let pending = if text.is_empty() {
            Vec::new()
        } else {
            vec![Piece {
                start: 0,
                end: text.len(),
                level: 0,
            }]
        };

        Chunks {
            text,
            separators: self.separators,
            max_chunk_size,
            pending,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Piece {
    start: usize,
    end: usize,
    /// Index of the next separator to try on this piece.
    level: usize,
}

/// Lazy sequence of contiguous, non-overlapping slices of the input.
///
/// Joining every chunk with `""` gives back the input. Each chunk is at most
/// `max_chunk_size` characters unless it is a single word that is longer on
/// its own, which is emitted whole.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    text: &'a str,
    separators: &'static [&'static str],
    max_chunk_size: usize,
    // Top of the stack is the next piece in text order.
    pending: Vec<Piece>,
}

impl<'a> Chunks<'a> {
    fn split_piece(&self, piece: Piece) -> Vec<Piece> {
        let separator = self.separators[piece.level];
        let mut offset = piece.start;

        self.text[piece.start..piece.end]
            .split_inclusive(separator)
            .map(|part| {
                let start = offset;
                offset += part.len();
                Piece {
                    start,
                    end: offset,
                    level: piece.level + 1,
                }
            })
            .collect()
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let mut current: Option<(usize, usize)> = None;
        let mut current_chars = 0;

        while let Some(piece) = self.pending.pop() {
            let piece_chars = self.text[piece.start..piece.end].chars().count();

            if current_chars + piece_chars <= self.max_chunk_size {
                current = Some(match current {
                    Some((start, _)) => (start, piece.end),
                    None => (piece.start, piece.end),
                });
                current_chars += piece_chars;
                continue;
            }

            if current.is_some() {
                self.pending.push(piece);
                break;
            }

            if piece.level >= self.separators.len() {
                return Some(&self.text[piece.start..piece.end]);
            }

            let parts = self.split_piece(piece);
            self.pending.extend(parts.into_iter().rev());
        }

        current.map(|(start, end)| &self.text[start..end])
    }
}
