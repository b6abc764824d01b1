//! Incremental UTF-8 decoding over `std::io::Read`

use std::io::{self, BufRead, BufReader, Read};

/// One decoded unit of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rune {
    Char(char),
    /// A maximal invalid byte sequence
    Invalid,
}

/// A rune with its byte interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decoded {
    pub rune: Rune,
    pub left: usize,
    pub right: usize,
}

/// Reads code points one at a time, never holding more than a buffer of input
pub struct RuneReader<R: Read> {
    reader: BufReader<R>,
    offset: usize,
}

impl<R: Read> RuneReader<R> {
    pub fn new(input: R) -> Self {
        Self {
            reader: BufReader::new(input),
            offset: 0,
        }
    }

    /// Bytes consumed so far
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode the next rune, `Ok(None)` at end of input
    pub fn next_rune(&mut self) -> io::Result<Option<Decoded>> {
        let Some(lead) = self.next_byte()? else {
            return Ok(None);
        };
        let left = self.offset - 1;

        let (width, init) = match lead {
            0x00..=0x7F => {
                return Ok(Some(Decoded {
                    rune: Rune::Char(lead as char),
                    left,
                    right: self.offset,
                }))
            }
            0xC2..=0xDF => (2, u32::from(lead & 0x1F)),
            0xE0..=0xEF => (3, u32::from(lead & 0x0F)),
            0xF0..=0xF4 => (4, u32::from(lead & 0x07)),
            _ => return Ok(Some(self.invalid(left))),
        };

        let mut code = init;
        for i in 1..width {
            let Some(byte) = self.peek_byte()? else {
                return Ok(Some(self.invalid(left)));
            };
            let valid = match (lead, i) {
                (0xE0, 1) => (0xA0..=0xBF).contains(&byte),
                (0xED, 1) => (0x80..=0x9F).contains(&byte),
                (0xF0, 1) => (0x90..=0xBF).contains(&byte),
                (0xF4, 1) => (0x80..=0x8F).contains(&byte),
                _ => (0x80..=0xBF).contains(&byte),
            };
            if !valid {
                return Ok(Some(self.invalid(left)));
            }
            self.consume(1);
            code = (code << 6) | u32::from(byte & 0x3F);
        }

        let rune = match char::from_u32(code) {
            Some(ch) => Rune::Char(ch),
            None => Rune::Invalid,
        };
        Ok(Some(Decoded {
            rune,
            left,
            right: self.offset,
        }))
    }

    fn invalid(&self, left: usize) -> Decoded {
        log::trace!("invalid UTF-8 at bytes {}..{}", left, self.offset);
        Decoded {
            rune: Rune::Invalid,
            left,
            right: self.offset,
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.consume(1);
        }
        Ok(byte)
    }

    fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn consume(&mut self, amount: usize) {
        self.reader.consume(amount);
        self.offset += amount;
    }
}
