/// Denomination, a suit or notrump
///
/// We choose this representation over `Option<Suit>` because the solver
/// tables have a row for every strain, and notrump is simply the fifth row.
///
/// The order of the suits deviates from [`dds`][dds], but this order provides
/// natural ordering by deriving [`PartialOrd`] and [`Ord`].
///
/// [dds]: https://github.com/dds-bridge/dds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Strain {
    /// ♣
    Clubs,
    /// ♦
    Diamonds,
    /// ♥
    Hearts,
    /// ♠
    Spades,
    /// NT, the strain not proposing a trump suit
    Notrump,
}

impl Strain {
    /// Helper constant for iteration over all strains
    pub const ALL: [Self; 5] = [
        Self::Clubs,
        Self::Diamonds,
        Self::Hearts,
        Self::Spades,
        Self::Notrump,
    ];

    /// Whether this strain is a suit
    #[must_use]
    pub const fn is_suit(self) -> bool {
        !matches!(self, Self::Notrump)
    }

    /// Whether this strain is notrump
    #[must_use]
    pub const fn is_notrump(self) -> bool {
        matches!(self, Self::Notrump)
    }
}

const _: () = {
    let mut i = 0;
    while i < Strain::ALL.len() {
        assert!(Strain::ALL[i] as usize == i);
        i += 1;
    }
};
