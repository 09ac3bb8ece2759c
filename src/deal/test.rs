use super::*;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng as _;

const _: () = {
    let mut bits: u16 = 0;
    loop {
        assert!(Holding::from_bits(bits).to_bits() == bits);
        if bits == u16::MAX {
            break;
        }
        bits += 1;
    }
};

const _: () = assert!(Hand::ALL.to_bits() == 0x7FFC_7FFC_7FFC_7FFC);

fn all_bit_patterns() -> impl DoubleEndedIterator<Item = Holding> {
    (0..=u16::MAX).map(Holding::from_bits)
}

#[test]
fn test_normalize_verifies() {
    all_bit_patterns().for_each(|holding| {
        let mut normalized = holding;
        assert!(normalized.normalize().verify());
        assert_eq!(normalized.to_bits(), holding.to_bits() & 0x7FFC);
    });
}

#[test]
fn test_verify_rejects_non_ranks() {
    all_bit_patterns().for_each(|holding| {
        assert_eq!(holding.verify(), holding.to_bits() & !0x7FFC == 0);
        assert_eq!(holding.verify(), holding == holding & Holding::ALL);
    });
}

#[test]
fn test_unverified_holding_reads() {
    const JUNK: Holding = Holding::from_bits(0b1000_0000_0000_0011);
    assert!(!JUNK.verify());
    assert!(JUNK.any());
    assert!(!JUNK.all());
    assert_eq!(JUNK.len(), 3);
    assert!(JUNK.test(0));
    assert!(JUNK.test(15));
    assert_eq!(JUNK.iter().count(), 0);
    assert_eq!(JUNK & Holding::ALL, Holding::EMPTY);
}

#[test]
fn test_full_width_operators() {
    all_bit_patterns()
        .zip(all_bit_patterns().rev())
        .for_each(|(u, v)| {
            assert_eq!((u & v).to_bits(), u.to_bits() & v.to_bits());
            assert_eq!((u | v).to_bits(), u.to_bits() | v.to_bits());
            assert_eq!((u ^ v).to_bits(), u.to_bits() ^ v.to_bits());
            assert_eq!((u - v).to_bits(), u.to_bits() & !v.to_bits());
            assert_eq!((!u).to_bits(), !u.to_bits());
            assert_eq!(u == v, u.to_bits() == v.to_bits());
        });
}

#[test]
fn test_out_of_range_ranks_are_ignored() {
    let mut holding = Holding::from_bits(0x8003);
    for rank in [16, 17, 31, 64, u8::MAX] {
        assert!(!holding.test(rank));
        assert!(!holding.contains(rank));
        assert!(!holding.insert(rank));
        assert!(!holding.remove(rank));
        assert!(!holding.toggle(rank));
        holding.set(rank).reset(rank).flip(rank);
        assert_eq!(holding.to_bits(), 0x8003);
    }
}

#[test]
fn test_assign_operators() {
    const AK: Holding = Holding::from_bits(0b11 << 13);
    const KQ: Holding = Holding::from_bits(0b11 << 12);
    let mut holding = AK;
    holding |= KQ;
    assert_eq!(holding, Holding::from_bits(0b111 << 12));
    holding -= AK;
    assert_eq!(holding, Holding::from_bits(1 << 12));
    holding ^= KQ;
    assert_eq!(holding, Holding::from_bits(1 << 13));
    holding &= AK;
    assert_eq!(holding, Holding::from_bits(1 << 13));
}

#[test]
fn test_holding_chaining() {
    let mut holding = Holding::EMPTY;
    holding.set(14).set(12).set(10).flip(10).flip(2).reset(12);
    assert_eq!(holding, Holding::from_bits(1 << 14 | 1 << 2));
    assert!(holding.verify());
}

#[test]
fn test_holding_insert_ignores_non_ranks() {
    let mut holding = Holding::EMPTY;
    assert!(!holding.insert(0));
    assert!(!holding.insert(15));
    assert!(holding.insert(9));
    assert!(!holding.insert(9));
    assert_eq!(holding, Holding::from_bits(1 << 9));
}

#[test]
fn test_iter_aqt() {
    const AQT: Holding = Holding::from_bits(0b10101 << 10);
    let mut iter = AQT.iter();
    assert_eq!(iter.len(), 3);
    assert_eq!(iter.next(), Some(10));
    assert_eq!(iter.next(), Some(12));
    assert_eq!(iter.next(), Some(14));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_iter_spot_cards() {
    const XXX: Holding = Holding::from_bits(0b10101 << 2);
    const XX: Holding = Holding::from_bits(0b1001 << 5);
    const HAND: Hand = Hand([XXX, Holding::EMPTY, XX, Holding::EMPTY]);
    let mut iter = HAND.iter();
    assert_eq!(iter.next(), Some(Card::new(Suit::Clubs, 2)));
    assert_eq!(iter.next(), Some(Card::new(Suit::Clubs, 4)));
    assert_eq!(iter.next(), Some(Card::new(Suit::Clubs, 6)));
    assert_eq!(iter.next(), Some(Card::new(Suit::Hearts, 5)));
    assert_eq!(iter.next(), Some(Card::new(Suit::Hearts, 8)));
    assert_eq!(iter.next(), None);
}

#[test]
fn test_card_packing() {
    assert_eq!(Card::new(Suit::Clubs, 2).to_bits(), 0b0010_00);
    assert_eq!(Card::new(Suit::Hearts, 12).to_bits(), 12 << 2 | 2);
    assert_eq!(Card::new(Suit::Spades, 14).to_bits(), 0b1110_11);

    Suit::ASC.into_iter().for_each(|suit| {
        (2..=14).for_each(|rank| {
            let card = Card::new(suit, rank);
            assert_eq!(card.suit(), suit);
            assert_eq!(card.rank(), rank);
        });
    });
}

#[test]
#[should_panic]
fn test_card_rejects_rank_one() {
    let _ = Card::new(Suit::Clubs, 1);
}

#[test]
fn test_suit_strain_conversion() {
    Suit::ASC.into_iter().for_each(|suit| {
        assert_eq!(Suit::try_from(Strain::from(suit)), Ok(suit));
    });
    assert_eq!(Suit::try_from(Strain::Notrump), Err(SuitFromNotrumpError));
}

#[test]
fn test_set_then_test_every_card() {
    assert_eq!(Hand::ALL.iter().count(), 52);

    Hand::ALL.iter().for_each(|card| {
        let mut hand = Hand::default();
        assert!(hand.set(card).test(card));
        assert_eq!(hand.len(), 1);
        assert!(hand.verify());
        assert!(hand.reset(card).is_empty());
    });
}

#[test]
fn test_hand_bit_layout() {
    let mut hand = Hand::EMPTY;
    hand.set(Card::new(Suit::Clubs, 2))
        .set(Card::new(Suit::Diamonds, 3))
        .set(Card::new(Suit::Hearts, 4))
        .set(Card::new(Suit::Spades, 14));
    assert_eq!(hand.to_bits(), 1 << 2 | 1 << 19 | 1 << 36 | 1 << 62);
    assert_eq!(Hand::from_bits(hand.to_bits()), hand);
    assert_eq!(hand[Suit::Spades], Holding::from_bits(1 << 14));
}

#[test]
fn test_hand_verify() {
    const SPADES: Hand = Hand([Holding::EMPTY, Holding::EMPTY, Holding::EMPTY, Holding::ALL]);
    assert!(SPADES.verify());
    assert!(!SPADES.all());

    let mut fourteen = SPADES;
    fourteen.set(Card::new(Suit::Clubs, 2));
    assert_eq!(fourteen.len(), 14);
    assert!(!fourteen.verify());

    let stray = Hand::from_bits(1 << 16);
    assert!(!stray.verify());
    assert!(stray.any());
    assert_eq!(stray.len(), 1);
    let mut normalized = stray;
    assert!(normalized.normalize().is_empty());
}

#[test]
fn test_unverified_hand_reads() {
    let junk = Hand::from_bits(u64::MAX);
    assert!(!junk.verify());
    assert!(junk.all());
    assert!(junk.any());
    assert_eq!(junk.len(), 64);
    assert_eq!(junk.iter().count(), 52);
    assert_eq!(!junk, Hand::EMPTY);
}

#[test]
fn test_deal_verify() {
    let deal = Deck::standard_52().deal();
    assert!(deal.verify());
    assert!(Deal::default().verify());

    let mut uneven = deal;
    uneven[Seat::North].remove(Card::new(Suit::Clubs, 2));
    assert!(!uneven.verify());

    let mut overlap = Deal::default();
    overlap[Seat::North].insert(Card::new(Suit::Hearts, 14));
    overlap[Seat::East].insert(Card::new(Suit::Hearts, 14));
    overlap[Seat::South].insert(Card::new(Suit::Hearts, 13));
    overlap[Seat::West].insert(Card::new(Suit::Hearts, 12));
    assert!(!overlap.verify());

    let mut stray = deal;
    stray[Seat::West].remove(Card::new(Suit::Spades, 2));
    stray[Seat::West] |= Hand::from_bits(1);
    assert!(!stray.verify());
}

#[test]
fn test_standard_deck_deals_in_blocks() {
    const fn only(suit: Suit) -> Hand {
        let mut holdings = [Holding::EMPTY; 4];
        holdings[suit as usize] = Holding::ALL;
        Hand(holdings)
    }

    let deal = Deck::standard_52().deal();
    assert_eq!(deal[Seat::North], only(Suit::Clubs));
    assert_eq!(deal[Seat::East], only(Suit::Diamonds));
    assert_eq!(deal[Seat::South], only(Suit::Hearts));
    assert_eq!(deal[Seat::West], only(Suit::Spades));
}

#[test]
fn test_random_deals() {
    (0..10_000).for_each(|_| {
        let deal = random_deal();
        let [n, e, s, w] = deal.0;
        assert!(deal.verify());
        assert_eq!(n | e | s | w, Hand::ALL);
        assert_eq!(n.len(), 13);
        assert_eq!(e.len(), 13);
        assert_eq!(s.len(), 13);
        assert_eq!(w.len(), 13);
    });
}

#[test]
fn test_seeded_deals_are_reproducible() {
    let first = Deal::new(&mut StdRng::seed_from_u64(42));
    let second = Deal::new(&mut StdRng::seed_from_u64(42));
    assert_eq!(first, second);

    let mut rng = StdRng::seed_from_u64(42);
    let distinct = core::iter::repeat_with(|| Deal::new(&mut rng))
        .take(100)
        .filter(|&deal| deal != first)
        .count();
    assert!(distinct >= 99);
}

#[test]
fn test_fill_unshuffled_order() {
    let mut deal = Deal::default();
    deal[Seat::North] = Hand([Holding::ALL, Holding::EMPTY, Holding::EMPTY, Holding::EMPTY]);
    Deck::from(deal.unassigned()).fill(&mut deal);

    assert_eq!(deal, Deck::standard_52().deal());
}

#[test]
fn test_fill_empty_deal() {
    let mut deal = Deal::default();
    fill_random_cards(&mut deal);
    assert!(deal.verify());
    assert_eq!(deal.union(), Hand::ALL);
    assert!(deal.0.iter().all(|hand| hand.len() == 13));
}

#[test]
fn test_fill_complete_deal_is_noop() {
    let before = random_deal();
    let mut after = before;
    fill_random_cards(&mut after);
    assert_eq!(before, after);
}

#[test]
fn test_fill_keeps_fixed_seats() {
    let mut rng = StdRng::seed_from_u64(7);
    let before = Deal::new(&mut rng);
    let mut after = before;
    after[Seat::East] = Hand::EMPTY;
    after[Seat::West] = Hand::EMPTY;
    after.fill_random(&mut rng);

    assert!(after.verify());
    assert_eq!(before[Seat::North], after[Seat::North]);
    assert_eq!(before[Seat::South], after[Seat::South]);
    assert_eq!(
        before[Seat::East] | before[Seat::West],
        after[Seat::East] | after[Seat::West]
    );
}

/// Generate a random deal and remove each card with a 50% chance
///
/// The seats end up with different numbers of cards, but no card is held
/// twice, which is exactly what [`Deal::fill_random`] accepts.
fn generate_thanos_deal(rng: &mut (impl rand::Rng + ?Sized)) -> Deal {
    let mut deal = Deal::new(rng);
    deal.0.iter_mut().for_each(|hand| {
        let mask: u64 = rng.gen();
        *hand = Hand::from_bits(hand.to_bits() & mask);
    });
    deal
}

proptest! {
    #[test]
    fn prop_fill_completes_partial_deals(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let before = generate_thanos_deal(&mut rng);
        let mut after = before;
        after.fill_random(&mut rng);

        prop_assert!(after.verify());
        prop_assert_eq!(after.union(), Hand::ALL);
        for seat in Seat::ALL {
            prop_assert_eq!(after[seat].len(), 13);
            prop_assert_eq!(before[seat] - after[seat], Hand::EMPTY);
        }
    }

    #[test]
    fn prop_fill_from_partial_masks(seed in any::<u64>(), masks in any::<[u64; 4]>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut deal = Deal::new(&mut rng);
        for (hand, mask) in deal.0.iter_mut().zip(masks) {
            *hand = Hand::from_bits(hand.to_bits() & mask);
        }
        fill_random_cards(&mut deal);
        prop_assert!(deal.verify());
        prop_assert!(deal.0.iter().all(|hand| hand.len() == 13));
    }
}
