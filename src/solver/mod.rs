
use crate::deal::{Deal, Seat, Suit};
use crate::Strain;
use bitflags::bitflags;
use core::ffi::c_int;
use dds_bridge_sys as sys;
use thiserror::Error;

/// DDS keeps its thread pool in global state, so we call it one at a time.
static THREAD_POOL: std::sync::Mutex<()> = std::sync::Mutex::new(());

/// Maximum number of (deal, strain) tables DDS solves in one call
///
/// This is `MAXNOOFTABLES * DDS_STRAINS` in DDS, which is also
/// [`sys::MAXNOOFBOARDS`].
pub const TABLE_CAPACITY: usize = sys::MAXNOOFBOARDS as usize;

/// Strains in the order DDS indexes its tables and filters
///
/// DDS puts the suits in the descending order, the mirror of [`Strain`].
pub const DDS_STRAIN_ORDER: [Strain; 5] = [
    Strain::Spades,
    Strain::Hearts,
    Strain::Diamonds,
    Strain::Clubs,
    Strain::Notrump,
];

/// The `mode` argument of [`sys::CalcAllTables`], passed through unchanged
///
/// `-1` asks DDS not to compute par scores.
const MODE: c_int = -1;

/// Errors that can occur in the solver
///
/// Each variant carries the status code DDS returns for it.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum Error {
    /// A general or unknown error
    #[error("General or unknown error")]
    UnknownFault = sys::RETURN_UNKNOWN_FAULT,

    /// Zero cards
    #[error("Zero cards")]
    ZeroCards = sys::RETURN_ZERO_CARDS,

    /// Target exceeds number of tricks
    #[error("Target exceeds number of tricks")]
    TargetTooHigh = sys::RETURN_TARGET_TOO_HIGH,

    /// Duplicate cards
    #[error("Cards duplicated")]
    DuplicateCards = sys::RETURN_DUPLICATE_CARDS,

    /// Target tricks < 0
    #[error("Target is less than -1")]
    NegativeTarget = sys::RETURN_TARGET_WRONG_LO,

    /// Target tricks > 13
    #[error("Target is higher than 13")]
    InvalidTarget = sys::RETURN_TARGET_WRONG_HI,

    /// Solving parameter < 1
    #[error("Solutions parameter is less than 1")]
    LowSolvingParameter = sys::RETURN_SOLNS_WRONG_LO,

    /// Solving parameter > 3
    #[error("Solutions parameter is higher than 3")]
    HighSolvingParameter = sys::RETURN_SOLNS_WRONG_HI,

    /// Too many cards
    #[error("Too many cards")]
    TooManyCards = sys::RETURN_TOO_MANY_CARDS,

    /// Wrong current suit or rank
    #[error("currentTrickSuit or currentTrickRank has wrong data")]
    CurrentSuitOrRank = sys::RETURN_SUIT_OR_RANK,

    /// Wrong played card
    #[error("Played card also remains in a hand")]
    PlayedCard = sys::RETURN_PLAYED_CARD,

    /// Wrong card count
    #[error("Wrong number of remaining cards in a hand")]
    CardCount = sys::RETURN_CARD_COUNT,

    /// Wrong thread index
    #[error("Thread index is not 0 .. maximum")]
    ThreadIndex = sys::RETURN_THREAD_INDEX,

    /// Mode parameter < 0
    #[error("Mode parameter is less than 0")]
    NegativeModeParameter = sys::RETURN_MODE_WRONG_LO,

    /// Mode parameter > 2
    #[error("Mode parameter is higher than 2")]
    HighModeParameter = sys::RETURN_MODE_WRONG_HI,

    /// Wrong trump suit
    #[error("Trump is not in 0 .. 4")]
    Trump = sys::RETURN_TRUMP_WRONG,

    /// Wrong "first"
    #[error("First is not in 0 .. 2")]
    First = sys::RETURN_FIRST_WRONG,

    /// `AnalysePlay*()` family of functions.
    /// (a) Less than 0 or more than 52 cards supplied.
    /// (b) Invalid suit or rank supplied.
    /// (c) A played card is not held by the right player.
    #[error("AnalysePlay input error")]
    AnalysePlay = sys::RETURN_PLAY_FAULT,

    /// Invalid PBN
    #[error("PBN string error")]
    PBN = sys::RETURN_PBN_FAULT,

    /// Too many boards
    #[error("Too many boards requested")]
    TooManyBoards = sys::RETURN_TOO_MANY_BOARDS,

    /// Cannot create a new thread
    #[error("Could not create threads")]
    ThreadCreate = sys::RETURN_THREAD_CREATE,

    /// Failed to wait for a thread
    #[error("Something failed waiting for thread to end")]
    ThreadWait = sys::RETURN_THREAD_WAIT,

    /// Missing threading system
    #[error("Multi-threading system not present")]
    ThreadMissing = sys::RETURN_THREAD_MISSING,

    /// No suit to solve
    #[error("Denomination filter vector has no entries")]
    NoSuit = sys::RETURN_NO_SUIT,

    /// Too many tables
    #[error("Too many (deal, strain) tables requested")]
    TooManyTables = sys::RETURN_TOO_MANY_TABLES,

    /// Invalid chunk size
    #[error("Chunk size is less than 1")]
    ChunkSize = sys::RETURN_CHUNK_SIZE,
}

impl Error {
    /// The error for a DDS status code, or [`None`] if the status is a success
    #[must_use]
    pub const fn from_status(status: c_int) -> Option<Self> {
        Some(match status {
            0.. => return None,
            sys::RETURN_ZERO_CARDS => Self::ZeroCards,
            sys::RETURN_TARGET_TOO_HIGH => Self::TargetTooHigh,
            sys::RETURN_DUPLICATE_CARDS => Self::DuplicateCards,
            sys::RETURN_TARGET_WRONG_LO => Self::NegativeTarget,
            sys::RETURN_TARGET_WRONG_HI => Self::InvalidTarget,
            sys::RETURN_SOLNS_WRONG_LO => Self::LowSolvingParameter,
            sys::RETURN_SOLNS_WRONG_HI => Self::HighSolvingParameter,
            sys::RETURN_TOO_MANY_CARDS => Self::TooManyCards,
            sys::RETURN_SUIT_OR_RANK => Self::CurrentSuitOrRank,
            sys::RETURN_PLAYED_CARD => Self::PlayedCard,
            sys::RETURN_CARD_COUNT => Self::CardCount,
            sys::RETURN_THREAD_INDEX => Self::ThreadIndex,
            sys::RETURN_MODE_WRONG_LO => Self::NegativeModeParameter,
            sys::RETURN_MODE_WRONG_HI => Self::HighModeParameter,
            sys::RETURN_TRUMP_WRONG => Self::Trump,
            sys::RETURN_FIRST_WRONG => Self::First,
            sys::RETURN_PLAY_FAULT => Self::AnalysePlay,
            sys::RETURN_PBN_FAULT => Self::PBN,
            sys::RETURN_TOO_MANY_BOARDS => Self::TooManyBoards,
            sys::RETURN_THREAD_CREATE => Self::ThreadCreate,
            sys::RETURN_THREAD_WAIT => Self::ThreadWait,
            sys::RETURN_THREAD_MISSING => Self::ThreadMissing,
            sys::RETURN_NO_SUIT => Self::NoSuit,
            sys::RETURN_TOO_MANY_TABLES => Self::TooManyTables,
            sys::RETURN_CHUNK_SIZE => Self::ChunkSize,
            _ => Self::UnknownFault,
        })
    }

    /// Propagate a status code to an error
    ///
    /// - `x`: Arbitrary data to return if `status` is non-negative (success)
    /// - `status`: The status code from a DDS function
    ///
    /// # Errors
    /// An [`enum@Error`] specified by `status`
    pub fn propagate<T>(x: T, status: c_int) -> Result<T, Self> {
        match Self::from_status(status) {
            None => Ok(x),
            Some(error) => Err(error),
        }
    }
}

bitflags! {
    /// Flags for the solver to solve for a strain
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StrainFlags : u8 {
        /// Solve for clubs ([`Strain::Clubs`])
        const CLUBS = 0x01;
        /// Solve for diamonds ([`Strain::Diamonds`])
        const DIAMONDS = 0x02;
        /// Solve for hearts ([`Strain::Hearts`])
        const HEARTS = 0x04;
        /// Solve for spades ([`Strain::Spades`])
        const SPADES = 0x08;
        /// Solve for notrump ([`Strain::Notrump`])
        const NOTRUMP = 0x10;
    }
}

impl StrainFlags {
    /// Number of strains to solve for
    #[must_use]
    pub const fn strains(self) -> usize {
        self.intersection(Self::all()).bits().count_ones() as usize
    }
}

impl Default for StrainFlags {
    /// Every strain
    fn default() -> Self {
        Self::all()
    }
}

impl From<Strain> for StrainFlags {
    fn from(strain: Strain) -> Self {
        Self::from_bits_retain(1 << strain as u8)
    }
}

/// Tricks that each seat can take as declarer for a strain
///
/// Four nibbles in [`Seat::ALL`] order, North in the lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TricksRow(u16);

impl TricksRow {
    /// Create a new row from the number of tricks each seat can take
    #[must_use]
    pub const fn new(n: u8, e: u8, s: u8, w: u8) -> Self {
        Self(
            ((n & 0xF) as u16) << (4 * Seat::North as u8)
                | ((e & 0xF) as u16) << (4 * Seat::East as u8)
                | ((s & 0xF) as u16) << (4 * Seat::South as u8)
                | ((w & 0xF) as u16) << (4 * Seat::West as u8),
        )
    }

    /// Get the number of tricks a seat can take as declarer
    #[must_use]
    pub const fn get(self, seat: Seat) -> u8 {
        (self.0 >> (4 * seat as u8) & 0xF) as u8
    }

    /// The packed nibbles
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Create a row from packed nibbles
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }
}

/// Tricks that each seat can take as declarer for all strains
///
/// The rows are in [`Strain::ALL`] order.  Tables come out of the solver;
/// rows for strains left out of a solve are zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TricksTable([TricksRow; 5]);

impl core::ops::Index<Strain> for TricksTable {
    type Output = TricksRow;

    fn index(&self, strain: Strain) -> &TricksRow {
        &self.0[strain as usize]
    }
}

impl TricksTable {
    /// Get the number of tricks a seat can take as declarer in a strain
    #[must_use]
    pub const fn get(self, strain: Strain, seat: Seat) -> u8 {
        self.0[strain as usize].get(seat)
    }

    /// The packed rows in [`Strain::ALL`] order
    #[must_use]
    pub const fn to_bits(self) -> [u16; 5] {
        let [c, d, h, s, n] = self.0;
        [c.0, d.0, h.0, s.0, n.0]
    }

    /// Create a table from packed rows in [`Strain::ALL`] order
    #[must_use]
    pub const fn from_bits(bits: [u16; 5]) -> Self {
        let [c, d, h, s, n] = bits;
        Self([
            TricksRow(c),
            TricksRow(d),
            TricksRow(h),
            TricksRow(s),
            TricksRow(n),
        ])
    }
}

#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
const fn make_row(row: [c_int; 4]) -> TricksRow {
    TricksRow::new(row[0] as u8, row[1] as u8, row[2] as u8, row[3] as u8)
}

impl From<sys::ddTableResults> for TricksTable {
    fn from(table: sys::ddTableResults) -> Self {
        let mut rows = [TricksRow(0); 5];

        for (strain, row) in DDS_STRAIN_ORDER.into_iter().zip(table.resTable) {
            rows[strain as usize] = make_row(row);
        }

        Self(rows)
    }
}

impl From<Deal> for sys::ddTableDeal {
    fn from(deal: Deal) -> Self {
        Self {
            cards: Seat::ALL.map(|seat| Suit::DESC.map(|suit| deal[seat][suit].to_bits().into())),
        }
    }
}

/// Convert strain flags to the reverse filter DDS expects
///
/// The filter is in [`DDS_STRAIN_ORDER`], and a non-zero entry means to skip
/// that strain.  For example, `[0, 0, 1, 1, 1]` means to solve for major suits
/// only.
#[must_use]
pub fn dds_filter(flags: StrainFlags) -> [c_int; 5] {
    DDS_STRAIN_ORDER.map(|strain| c_int::from(!flags.contains(StrainFlags::from(strain))))
}

/// Number of deals in a full pack for `flags`
///
/// Returns [`None`] if `flags` contains no strain.
#[must_use]
pub const fn pack_size(flags: StrainFlags) -> Option<usize> {
    match flags.strains() {
        0 => None,
        strains => Some(TABLE_CAPACITY / strains),
    }
}

/// A double dummy engine solving a pack of deals in one blocking call
pub trait Engine {
    /// Solve a pack of deals
    ///
    /// - `deals`: Deals in the DDS layout, at most [`pack_size`] of them
    /// - `filter`: Reverse filter as made by [`dds_filter`]
    ///
    /// Returns one table per deal in the order of `deals`.
    ///
    /// # Errors
    /// An [`enum@Error`] reported by the engine
    fn solve_pack(
        &mut self,
        deals: &[sys::ddTableDeal],
        filter: [c_int; 5],
    ) -> Result<Vec<sys::ddTableResults>, Error>;
}

/// The DDS library via [`sys::CalcAllTables`]
#[derive(Debug, Clone, Copy, Default)]
pub struct Dds;

impl Engine for Dds {
    fn solve_pack(
        &mut self,
        deals: &[sys::ddTableDeal],
        mut filter: [c_int; 5],
    ) -> Result<Vec<sys::ddTableResults>, Error> {
        let strains = filter.iter().filter(|&&skip| skip == 0).count();
        if deals.len() > TABLE_CAPACITY || deals.len() * strains > TABLE_CAPACITY {
            return Err(Error::TooManyTables);
        }

        let mut pack = sys::ddTableDeals {
            #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
            noOfTables: deals.len() as c_int,
            ..Default::default()
        };
        pack.deals[..deals.len()].copy_from_slice(deals);

        let mut res = sys::ddTablesRes::default();
        let _guard = THREAD_POOL.lock().map_err(|_| Error::ThreadWait)?;
        // SAFETY: `pack` holds `noOfTables` deals and `filter` has 5 entries.
        let status = unsafe {
            sys::CalcAllTables(
                &mut pack,
                MODE,
                &mut filter[0],
                &mut res,
                &mut sys::allParResults::default(),
            )
        };
        Error::propagate(res.results[..deals.len()].to_vec(), status)
    }
}

/// Solve a single deal for all strains with [`sys::CalcDDtable`]
///
/// # Errors
/// An [`enum@Error`] propagated from DDS
pub fn solve_deal(deal: Deal) -> Result<TricksTable, Error> {
    let mut result = sys::ddTableResults::default();
    let _guard = THREAD_POOL.lock().map_err(|_| Error::ThreadWait)?;
    // SAFETY: `result` is a valid output buffer for one table.
    let status = unsafe { sys::CalcDDtable(deal.into(), &mut result) };
    Error::propagate(result.into(), status)
}

/// Solve deals for given strains with a custom engine
///
/// The deals are split into packs of [`pack_size`] deals, and the packs are
/// solved one after another.  The tables come back in the order of `deals`.
/// Rows for strains not in `flags` are zero.
///
/// No pack is sent to the engine if `deals` is empty.
///
/// # Errors
/// - [`Error::NoSuit`] if `deals` is not empty but `flags` contains no strain
/// - The first [`enum@Error`] from the engine, discarding all tables
pub fn solve_deals_with<E: Engine + ?Sized>(
    engine: &mut E,
    deals: &[Deal],
    flags: StrainFlags,
) -> Result<Vec<TricksTable>, Error> {
    if deals.is_empty() {
        return Ok(Vec::new());
    }

    let length = pack_size(flags).ok_or(Error::NoSuit)?;
    let filter = dds_filter(flags);
    debug_assert!(
        deals.iter().all(|deal| deal.verify()),
        "solving an unverified deal"
    );

    tracing::debug!(
        deals = deals.len(),
        strains = flags.strains(),
        pack_size = length,
        packs = deals.len().div_ceil(length),
        "solving deals"
    );

    let mut tables = Vec::with_capacity(deals.len());

    for (index, pack) in deals.chunks(length).enumerate() {
        let wire: Vec<sys::ddTableDeal> = pack.iter().copied().map(Into::into).collect();
        tracing::debug!(pack = index, deals = pack.len(), "solving pack");

        let results = engine.solve_pack(&wire, filter).map_err(|error| {
            tracing::warn!(pack = index, %error, "double dummy engine failed");
            error
        })?;
        debug_assert_eq!(results.len(), pack.len(), "engine returned a short pack");
        tables.extend(results.into_iter().map(TricksTable::from));
    }

    Ok(tables)
}

/// Solve deals for given strains with DDS
///
/// See [`solve_deals_with`] for the batching rules.
///
/// # Errors
/// An [`enum@Error`] propagated from DDS
pub fn solve_deals(deals: &[Deal], flags: StrainFlags) -> Result<Vec<TricksTable>, Error> {
    solve_deals_with(&mut Dds, deals, flags)
}
