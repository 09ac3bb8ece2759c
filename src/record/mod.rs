
use crate::deal::{Deal, Hand, Holding, Seat, Suit};
use crate::solver::{solve_deals_with, Dds, Engine, Error, StrainFlags, TricksTable};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};

/// A solved deal in a fixed-size binary layout
///
/// A record is [`Record::SIZE`] bytes of little-endian `u16`s:
///
/// 1. 16 holdings, seats in [`Seat::ALL`] order and suits in [`Suit::ASC`]
///    order within each seat
/// 2. 5 rows of tricks in [`crate::Strain::ALL`] order, as in
///    [`TricksTable::to_bits`]
///
/// Records are stored back to back, so the `n`-th record of a file starts at
/// byte `n * Record::SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record {
    /// The deal
    pub deal: Deal,
    /// Tricks each seat takes as declarer
    pub tricks: TricksTable,
}

impl Record {
    /// Size of an encoded record in bytes
    pub const SIZE: usize = 2 * (16 + 5);

    /// Encode the record
    #[must_use]
    pub fn to_bytes(self) -> [u8; Self::SIZE] {
        let holdings = Seat::ALL
            .into_iter()
            .flat_map(|seat| Suit::ASC.map(|suit| self.deal[seat][suit].to_bits()));
        let words = holdings.chain(self.tricks.to_bits());

        let mut bytes = [0; Self::SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(2).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    /// Decode a record
    ///
    /// The deal is taken as is.  Call [`Deal::verify`] to check it.
    #[must_use]
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        let mut words = [0; 16 + 5];
        for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(2)) {
            *word = u16::from_le_bytes([chunk[0], chunk[1]]);
        }

        let mut deal = Deal::default();
        for (seat, holdings) in Seat::ALL.into_iter().zip(words.chunks_exact(4)) {
            deal[seat] = Hand([
                Holding::from_bits(holdings[0]),
                Holding::from_bits(holdings[1]),
                Holding::from_bits(holdings[2]),
                Holding::from_bits(holdings[3]),
            ]);
        }

        let [.., c, d, h, s, n] = words;
        Self {
            deal,
            tricks: TricksTable::from_bits([c, d, h, s, n]),
        }
    }

    /// Write the record to a stream
    ///
    /// # Errors
    /// Any I/O error from `writer`
    pub fn write_to(self, mut writer: impl Write) -> io::Result<()> {
        writer.write_all(&self.to_bytes())
    }

    /// Read a record from a stream
    ///
    /// # Errors
    /// Any I/O error from `reader`, including [`ErrorKind::UnexpectedEof`] if
    /// the stream ends before a whole record
    pub fn read_from(mut reader: impl Read) -> io::Result<Self> {
        let mut bytes = [0; Self::SIZE];
        reader.read_exact(&mut bytes)?;
        Ok(Self::from_bytes(bytes))
    }

    /// Read the `index`-th record of a stream of records
    ///
    /// # Errors
    /// Any I/O error from `reader`
    pub fn read_nth(mut reader: impl Read + Seek, index: u64) -> io::Result<Self> {
        let offset = index
            .checked_mul(Self::SIZE as u64)
            .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "record index overflow"))?;
        reader.seek(SeekFrom::Start(offset))?;
        Self::read_from(reader)
    }
}

/// Iterator over the records of a stream
///
/// Created by [`records`].
#[derive(Debug)]
pub struct Records<R> {
    reader: R,
    done: bool,
}

impl<R: Read> Iterator for Records<R> {
    type Item = io::Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut bytes = [0; Record::SIZE];
        let mut filled = 0;

        while filled < Record::SIZE {
            match self.reader.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        match filled {
            Record::SIZE => Some(Ok(Record::from_bytes(bytes))),
            0 => {
                self.done = true;
                None
            }
            _ => {
                self.done = true;
                tracing::warn!(bytes = filled, "truncated record at end of stream");
                Some(Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    "truncated record",
                )))
            }
        }
    }
}

impl<R: Read> core::iter::FusedIterator for Records<R> {}

/// Iterate over the records of a stream until its end
///
/// The iterator ends cleanly if the stream ends on a record boundary.  A
/// trailing partial record yields an [`ErrorKind::UnexpectedEof`] error, after
/// which the iterator ends.
pub const fn records<R: Read>(reader: R) -> Records<R> {
    Records {
        reader,
        done: false,
    }
}

/// Solve deals with a custom engine and pair them with their tables
///
/// # Errors
/// See [`solve_deals_with`]
pub fn solve_records_with<E: Engine + ?Sized>(
    engine: &mut E,
    deals: &[Deal],
    flags: StrainFlags,
) -> Result<Vec<Record>, Error> {
    let tables = solve_deals_with(engine, deals, flags)?;

    Ok(deals
        .iter()
        .zip(tables)
        .map(|(&deal, tricks)| Record { deal, tricks })
        .collect())
}

/// Solve deals with DDS and pair them with their tables
///
/// # Errors
/// An [`enum@Error`] propagated from DDS
pub fn solve_records(deals: &[Deal], flags: StrainFlags) -> Result<Vec<Record>, Error> {
    solve_records_with(&mut Dds, deals, flags)
}
