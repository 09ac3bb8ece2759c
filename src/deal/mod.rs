#[cfg(test)]
mod test;

use crate::Strain;
use core::num::NonZeroU8;
use core::ops::{
    BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Index, IndexMut, Not, Sub,
    SubAssign,
};
use rand::prelude::SliceRandom as _;
use thiserror::Error;

/// Number of cards each seat holds in a complete deal
const HAND_SIZE: usize = 13;

/// A suit of playing cards
///
/// Suits are convertible to [`Strain`]s since suits form a subset of strains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Suit {
    /// ♣, convertible to [`Strain::Clubs`]
    Clubs,
    /// ♦, convertible to [`Strain::Diamonds`]
    Diamonds,
    /// ♥, convertible to [`Strain::Hearts`]
    Hearts,
    /// ♠, convertible to [`Strain::Spades`]
    Spades,
}

impl Suit {
    /// Suits in the ascending order, the storage order in this crate
    pub const ASC: [Self; 4] = [Self::Clubs, Self::Diamonds, Self::Hearts, Self::Spades];

    /// Suits in the descending order, the order in [`dds_bridge_sys`]
    pub const DESC: [Self; 4] = [Self::Spades, Self::Hearts, Self::Diamonds, Self::Clubs];
}

impl From<Suit> for Strain {
    fn from(suit: Suit) -> Self {
        match suit {
            Suit::Clubs => Self::Clubs,
            Suit::Diamonds => Self::Diamonds,
            Suit::Hearts => Self::Hearts,
            Suit::Spades => Self::Spades,
        }
    }
}

/// Error raised when converting [`Strain::Notrump`] to a suit
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Notrump is not a suit")]
pub struct SuitFromNotrumpError;

impl TryFrom<Strain> for Suit {
    type Error = SuitFromNotrumpError;

    fn try_from(strain: Strain) -> Result<Self, Self::Error> {
        match strain {
            Strain::Clubs => Ok(Self::Clubs),
            Strain::Diamonds => Ok(Self::Diamonds),
            Strain::Hearts => Ok(Self::Hearts),
            Strain::Spades => Ok(Self::Spades),
            Strain::Notrump => Err(SuitFromNotrumpError),
        }
    }
}

/// Position at the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Seat {
    /// Dealer of Board 1, partner of [`Seat::South`]
    North,
    /// Dealer of Board 2, partner of [`Seat::West`]
    East,
    /// Dealer of Board 3, partner of [`Seat::North`]
    South,
    /// Dealer of Board 4, partner of [`Seat::East`]
    West,
}

impl Seat {
    /// Seats in the clockwise order starting from North, also the dealing order
    pub const ALL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];
}

/// A playing card
///
/// The card is packed into a byte: the suit in the lowest 2 bits and the rank
/// in the next 4 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card(NonZeroU8);

impl Card {
    /// Create a card from suit and rank
    ///
    /// The rank is a number from 2 to 14.  J, Q, K, A are encoded as 11, 12,
    /// 13, 14 respectively.
    ///
    /// # Panics
    /// Panics if the rank is not in the range 2..=14.
    #[must_use]
    pub const fn new(suit: Suit, rank: u8) -> Self {
        assert!(rank >= 2 && rank <= 14);
        match NonZeroU8::new(rank << 2 | suit as u8) {
            Some(bits) => Self(bits),
            None => unreachable!(),
        }
    }

    /// The suit of the card
    #[must_use]
    pub const fn suit(self) -> Suit {
        Suit::ASC[(self.0.get() & 3) as usize]
    }

    /// The rank of the card
    ///
    /// The rank is a number from 2 to 14.  J, Q, K, A are denoted as 11, 12,
    /// 13, 14 respectively.
    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0.get() >> 2
    }

    /// The packed byte, `rank << 2 | suit`
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        self.0.get()
    }
}

/// A bitset whose size is known at compile time
pub trait SmallSet<T>: Copy + Eq + BitAnd + BitOr + BitXor + Not + Sub {
    /// The empty set
    const EMPTY: Self;

    /// The set containing all possible values
    const ALL: Self;

    /// The number of elements in the set
    #[must_use]
    fn len(self) -> usize;

    /// Whether the set is empty
    #[must_use]
    fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    /// Whether the set contains a value
    fn contains(self, value: T) -> bool;

    /// Insert a value into the set
    fn insert(&mut self, value: T) -> bool;

    /// Remove a value from the set
    fn remove(&mut self, value: T) -> bool;

    /// Toggle a value in the set
    fn toggle(&mut self, value: T) -> bool;
}

/// Bitwise operators over the full storage width, plus set difference
macro_rules! impl_bit_ops {
    ($set:ty) => {
        impl BitAnd for $set {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                Self::from_bits(self.to_bits() & rhs.to_bits())
            }
        }

        impl BitOr for $set {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                Self::from_bits(self.to_bits() | rhs.to_bits())
            }
        }

        impl BitXor for $set {
            type Output = Self;

            fn bitxor(self, rhs: Self) -> Self {
                Self::from_bits(self.to_bits() ^ rhs.to_bits())
            }
        }

        impl Not for $set {
            type Output = Self;

            fn not(self) -> Self {
                Self::from_bits(!self.to_bits())
            }
        }

        impl Sub for $set {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                self & !rhs
            }
        }

        impl BitAndAssign for $set {
            fn bitand_assign(&mut self, rhs: Self) {
                *self = *self & rhs;
            }
        }

        impl BitOrAssign for $set {
            fn bitor_assign(&mut self, rhs: Self) {
                *self = *self | rhs;
            }
        }

        impl BitXorAssign for $set {
            fn bitxor_assign(&mut self, rhs: Self) {
                *self = *self ^ rhs;
            }
        }

        impl SubAssign for $set {
            fn sub_assign(&mut self, rhs: Self) {
                *self = *self - rhs;
            }
        }
    };
}

/// Bit `rank` of a holding, or zero if `rank` is past the storage width
const fn bit(rank: u8) -> u16 {
    match 1u16.checked_shl(rank as u32) {
        Some(bit) => bit,
        None => 0,
    }
}

/// A set of cards of the same suit
///
/// Rank `r` is stored in bit `r`, so only bits 2..=14 (`0x7FFC`) denote real
/// cards.  The remaining bits are kept as they are, which makes a holding
/// built from arbitrary bits unverified rather than invalid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Holding(u16);

impl SmallSet<u8> for Holding {
    const EMPTY: Self = Self(0);
    const ALL: Self = Self(0x7FFC);

    fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    fn contains(self, rank: u8) -> bool {
        self.test(rank)
    }

    fn insert(&mut self, rank: u8) -> bool {
        let insertion = bit(rank) & Self::ALL.0;
        let inserted = insertion & !self.0 != 0;
        self.0 |= insertion;
        inserted
    }

    fn remove(&mut self, rank: u8) -> bool {
        let removed = self.contains(rank);
        self.0 &= !bit(rank);
        removed
    }

    fn toggle(&mut self, rank: u8) -> bool {
        self.0 ^= bit(rank) & Self::ALL.0;
        self.contains(rank)
    }
}

impl Holding {
    /// As a bitset of ranks
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Create a holding from a bitset of ranks
    ///
    /// Every bit is retained.  Call [`Holding::normalize`] to drop bits that
    /// are not ranks.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Whether bit `rank` is set
    ///
    /// Ranks past the 16-bit storage are never set.
    #[must_use]
    pub const fn test(self, rank: u8) -> bool {
        self.0 & bit(rank) != 0
    }

    /// Whether any bit is set, including bits that are not ranks
    #[must_use]
    pub const fn any(self) -> bool {
        self.0 != 0
    }

    /// Whether every rank from 2 to A is present
    #[must_use]
    pub const fn all(self) -> bool {
        self.0 & Self::ALL.0 == Self::ALL.0
    }

    /// Whether no bit outside 2..=14 is set
    #[must_use]
    pub const fn verify(self) -> bool {
        self.0 & !Self::ALL.0 == 0
    }

    /// Clear the bits that are not ranks
    pub fn normalize(&mut self) -> &mut Self {
        self.0 &= Self::ALL.0;
        self
    }

    /// Add a rank
    pub fn set(&mut self, rank: u8) -> &mut Self {
        self.insert(rank);
        self
    }

    /// Remove a rank
    pub fn reset(&mut self, rank: u8) -> &mut Self {
        self.remove(rank);
        self
    }

    /// Toggle a rank
    pub fn flip(&mut self, rank: u8) -> &mut Self {
        self.toggle(rank);
        self
    }

    /// Iterate over the ranks in ascending order
    ///
    /// Bits that are not ranks are skipped.
    #[must_use]
    pub const fn iter(self) -> HoldingIter {
        HoldingIter {
            rest: self.0 & Self::ALL.0,
        }
    }
}

impl_bit_ops!(Holding);

/// Iterator over the ranks of a [`Holding`]
#[derive(Debug, Clone, Copy)]
pub struct HoldingIter {
    rest: u16,
}

impl Iterator for HoldingIter {
    type Item = u8;

    fn next(&mut self) -> Option<u8> {
        if self.rest == 0 {
            return None;
        }
        #[allow(clippy::cast_possible_truncation)]
        let rank = self.rest.trailing_zeros() as u8;
        self.rest &= self.rest - 1;
        Some(rank)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.rest.count_ones() as usize;
        (len, Some(len))
    }
}

impl ExactSizeIterator for HoldingIter {}

impl core::iter::FusedIterator for HoldingIter {}

impl IntoIterator for Holding {
    type Item = u8;
    type IntoIter = HoldingIter;

    fn into_iter(self) -> HoldingIter {
        self.iter()
    }
}

/// A hand of playing cards
///
/// The holdings are stored in [`Suit::ASC`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Hand(pub [Holding; 4]);

impl Index<Suit> for Hand {
    type Output = Holding;

    fn index(&self, suit: Suit) -> &Holding {
        &self.0[suit as usize]
    }
}

impl IndexMut<Suit> for Hand {
    fn index_mut(&mut self, suit: Suit) -> &mut Holding {
        &mut self.0[suit as usize]
    }
}

impl Hand {
    /// As a bitset of cards
    ///
    /// Clubs take the lowest 16 bits, followed by diamonds, hearts and spades.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        let [clubs, diamonds, hearts, spades] = self.0;
        clubs.to_bits() as u64
            | (diamonds.to_bits() as u64) << 16
            | (hearts.to_bits() as u64) << 32
            | (spades.to_bits() as u64) << 48
    }

    /// Create a hand from a bitset of cards
    ///
    /// Every bit is retained, see [`Hand::to_bits`] for the layout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_bits(bits: u64) -> Self {
        Self([
            Holding::from_bits(bits as u16),
            Holding::from_bits((bits >> 16) as u16),
            Holding::from_bits((bits >> 32) as u16),
            Holding::from_bits((bits >> 48) as u16),
        ])
    }

    /// Whether the hand holds the card
    #[must_use]
    pub fn test(self, card: Card) -> bool {
        self[card.suit()].test(card.rank())
    }

    /// Whether any bit is set, including bits that are not cards
    #[must_use]
    pub const fn any(self) -> bool {
        self.to_bits() != 0
    }

    /// Whether every card of the deck is present
    #[must_use]
    pub const fn all(self) -> bool {
        self.to_bits() & Self::ALL.to_bits() == Self::ALL.to_bits()
    }

    /// Whether every holding is verified and the hand has at most 13 cards
    #[must_use]
    pub const fn verify(self) -> bool {
        self.to_bits() & !Self::ALL.to_bits() == 0 && self.to_bits().count_ones() < 14
    }

    /// Clear the bits that are not cards
    pub fn normalize(&mut self) -> &mut Self {
        *self = Self::from_bits(self.to_bits() & Self::ALL.to_bits());
        self
    }

    /// Add a card
    pub fn set(&mut self, card: Card) -> &mut Self {
        self.insert(card);
        self
    }

    /// Remove a card
    pub fn reset(&mut self, card: Card) -> &mut Self {
        self.remove(card);
        self
    }

    /// Toggle a card
    pub fn flip(&mut self, card: Card) -> &mut Self {
        self.toggle(card);
        self
    }

    /// Iterate over the cards, by suit in [`Suit::ASC`] order, then by rank
    pub fn iter(self) -> impl Iterator<Item = Card> {
        Suit::ASC
            .into_iter()
            .flat_map(move |suit| self[suit].iter().map(move |rank| Card::new(suit, rank)))
    }
}

impl SmallSet<Card> for Hand {
    const EMPTY: Self = Self([Holding::EMPTY; 4]);
    const ALL: Self = Self([Holding::ALL; 4]);

    fn len(self) -> usize {
        self.to_bits().count_ones() as usize
    }

    fn contains(self, card: Card) -> bool {
        self.test(card)
    }

    fn insert(&mut self, card: Card) -> bool {
        self[card.suit()].insert(card.rank())
    }

    fn remove(&mut self, card: Card) -> bool {
        self[card.suit()].remove(card.rank())
    }

    fn toggle(&mut self, card: Card) -> bool {
        self[card.suit()].toggle(card.rank())
    }
}

impl_bit_ops!(Hand);

/// A deal of four hands
///
/// The hands are stored in [`Seat::ALL`] order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Deal(pub [Hand; 4]);

impl Index<Seat> for Deal {
    type Output = Hand;

    fn index(&self, seat: Seat) -> &Hand {
        &self.0[seat as usize]
    }
}

impl IndexMut<Seat> for Deal {
    fn index_mut(&mut self, seat: Seat) -> &mut Hand {
        &mut self.0[seat as usize]
    }
}

impl Deal {
    /// Create a deal from a shuffled standard 52-card deck
    ///
    /// The first 13 cards of the shuffled deck go to North, the next 13 to
    /// East, then South and West.
    pub fn new(rng: &mut (impl rand::Rng + ?Sized)) -> Self {
        let mut deck = Deck::standard_52();
        deck.shuffle(rng);
        let deal = deck.deal();
        debug_assert!(deal.verify(), "random deal failed verification: {deal:?}");
        deal
    }

    /// Whether this is a consistent deal
    ///
    /// Every hand is verified, all hands have the same number of cards, and
    /// no card is held by two hands.
    #[must_use]
    pub fn verify(self) -> bool {
        let [n, e, s, w] = self.0;
        self.0.iter().all(|hand| hand.verify())
            && n.len() == e.len()
            && e.len() == s.len()
            && s.len() == w.len()
            && (n & e).is_empty()
            && (n & s).is_empty()
            && (n & w).is_empty()
            && (e & s).is_empty()
            && (e & w).is_empty()
            && (s & w).is_empty()
    }

    /// Cards held by any seat
    #[must_use]
    pub fn union(self) -> Hand {
        self.0.into_iter().fold(Hand::EMPTY, |acc, hand| acc | hand)
    }

    /// Cards of the deck held by no seat
    #[must_use]
    pub fn unassigned(self) -> Hand {
        Hand::ALL - self.union()
    }

    /// Total number of cards the seats need to reach 13 each
    fn shortfall(self) -> usize {
        self.0
            .iter()
            .map(|hand| HAND_SIZE.saturating_sub(hand.len()))
            .sum()
    }

    /// Deal the unassigned cards at random to seats holding fewer than 13
    ///
    /// The unassigned cards are shuffled and dealt from the top, topping up
    /// North first, then East, South and West.  Cards already in the deal stay
    /// where they are.
    ///
    /// The existing cards must not overlap, so that the unassigned cards are
    /// exactly as many as the seats are missing.  This precondition is only
    /// asserted in debug builds.  When it is broken in release builds, the
    /// last seats to be filled are left short.
    pub fn fill_random(&mut self, rng: &mut (impl rand::Rng + ?Sized)) {
        let mut deck = Deck::from(self.unassigned());
        debug_assert_eq!(
            deck.cards.len(),
            self.shortfall(),
            "unassigned cards do not match the missing cards: {self:?}"
        );
        tracing::trace!(cards = deck.cards.len(), "completing a partial deal");
        deck.shuffle(rng);
        deck.fill(self);
        debug_assert!(self.verify(), "completed deal failed verification: {self:?}");
    }
}

/// A deck of playing cards
#[derive(Debug, Clone, Default)]
struct Deck {
    /// The cards in the deck, the first card on top
    cards: Vec<Card>,
}

impl From<Hand> for Deck {
    fn from(hand: Hand) -> Self {
        Self {
            cards: hand.iter().collect(),
        }
    }
}

impl Deck {
    /// Create a standard 52-card deck
    #[must_use]
    fn standard_52() -> Self {
        Self::from(Hand::ALL)
    }

    /// Shuffle the deck
    fn shuffle(&mut self, rng: &mut (impl rand::Rng + ?Sized)) {
        self.cards.shuffle(rng);
    }

    /// Deal the deck into four hands, 13 consecutive cards per seat
    #[must_use]
    fn deal(self) -> Deal {
        let mut deal = Deal::default();

        for (seat, cards) in Seat::ALL.into_iter().zip(self.cards.chunks(HAND_SIZE)) {
            for &card in cards {
                deal[seat].insert(card);
            }
        }

        deal
    }

    /// Top up every seat to 13 cards from the top of the deck
    fn fill(self, deal: &mut Deal) {
        let mut cards = self.cards.into_iter();

        for seat in Seat::ALL {
            let missing = HAND_SIZE.saturating_sub(deal[seat].len());
            for card in cards.by_ref().take(missing) {
                deal[seat].insert(card);
            }
        }
    }
}

/// Create a random deal with the thread-local generator
///
/// The generator is [`rand::thread_rng`], seeded from the operating system
/// the first time a thread uses it and kept for the lifetime of the thread.
/// Use [`Deal::new`] to supply a generator explicitly.
#[must_use]
pub fn random_deal() -> Deal {
    Deal::new(&mut rand::thread_rng())
}

/// Complete a partial deal with the thread-local generator
///
/// See [`Deal::fill_random`] for the precondition on `deal`.
pub fn fill_random_cards(deal: &mut Deal) {
    deal.fill_random(&mut rand::thread_rng());
}
