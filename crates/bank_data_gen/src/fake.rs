//! Fake data generation helpers.
//!
//! Every value is drawn from the wrapped RNG, so a seeded RNG gives a
//! reproducible stream of names, dates, amounts and codes.

use crate::domain::{DateWindow, IntRange, RateRange, CITIES};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use fake::faker::address::en::{BuildingNumber, StreetName};
use fake::faker::company::en::CompanyName;
use fake::faker::creditcard::en::CreditCardNumber;
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::Words;
use fake::faker::name::en::Name;
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::Rng;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fake data generator with deterministic RNG
pub struct FakeData<R: Rng> {
    rng: R,
}

impl<R: Rng> FakeData<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Generate a full name
    pub fn full_name(&mut self) -> String {
        Name().fake_with_rng(&mut self.rng)
    }

    pub fn email(&mut self) -> String {
        SafeEmail().fake_with_rng(&mut self.rng)
    }

    pub fn phone(&mut self) -> String {
        PhoneNumber().fake_with_rng(&mut self.rng)
    }

    pub fn company_name(&mut self) -> String {
        CompanyName().fake_with_rng(&mut self.rng)
    }

    /// Generate a street address ("12 Main Street")
    pub fn street_address(&mut self) -> String {
        let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        format!("{} {}", number, street)
    }

    pub fn card_number(&mut self) -> String {
        CreditCardNumber().fake_with_rng(&mut self.rng)
    }

    /// Generate a sentence (capitalized, with period)
    pub fn sentence(&mut self, word_count: usize) -> String {
        let words: Vec<String> = Words(word_count..word_count + 1).fake_with_rng(&mut self.rng);
        let mut text = words.join(" ");
        if let Some(first) = text.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        text.push('.');
        text
    }

    pub fn city(&mut self) -> &'static str {
        *self.pick(CITIES)
    }

    /// Pick a random element from a non-empty slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> &'a T {
        &items[self.rng.random_range(0..items.len())]
    }

    /// Generate a random integer in an inclusive range
    pub fn int_in(&mut self, range: IntRange) -> i64 {
        self.rng.random_range(range.min..=range.max)
    }

    /// Generate an identifier in `[1, count]`
    pub fn id_up_to(&mut self, count: u64) -> i64 {
        self.rng.random_range(1..=count) as i64
    }

    /// Generate a rate rounded to two decimals
    pub fn rate_in(&mut self, range: RateRange) -> f64 {
        if range.min >= range.max {
            return range.min;
        }
        let value = self.rng.random_range(range.min..range.max);
        let rounded = (value * 100.0).round() / 100.0;
        rounded.clamp(range.min, range.max)
    }

    /// Generate a date inside the window
    pub fn date_in(&mut self, window: DateWindow) -> NaiveDate {
        let span = (window.end() - window.start()).num_days();
        window.start() + Duration::days(self.rng.random_range(0..=span))
    }

    /// Generate a timestamp on any second of the window's days.
    ///
    /// The window is a range of whole days, so the last day runs to 23:59:59
    /// even when it is the run's reference date.
    pub fn datetime_in(&mut self, window: DateWindow) -> NaiveDateTime {
        let days = (window.end() - window.start()).num_days() + 1;
        let offset = self.rng.random_range(0..days * SECONDS_PER_DAY);
        window.start().and_time(NaiveTime::MIN) + Duration::seconds(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn fake(seed: u64) -> FakeData<ChaCha8Rng> {
        FakeData::new(ChaCha8Rng::seed_from_u64(seed))
    }

    fn window(start: (i32, u32, u32), end: (i32, u32, u32)) -> DateWindow {
        DateWindow::new(
            "test",
            NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_deterministic_generation() {
        let mut fake1 = fake(42);
        let mut fake2 = fake(42);

        // Same seed should produce same results
        assert_eq!(fake1.full_name(), fake2.full_name());
        assert_eq!(fake1.company_name(), fake2.company_name());
        assert_eq!(fake1.card_number(), fake2.card_number());
        assert_eq!(
            fake1.rate_in(RateRange { min: 6.5, max: 12.5 }),
            fake2.rate_in(RateRange { min: 6.5, max: 12.5 })
        );
    }

    #[test]
    fn test_int_in_stays_in_bounds() {
        let mut fake = fake(1);
        let range = IntRange::new_unchecked(100, 105);
        for _ in 0..500 {
            let v = fake.int_in(range);
            assert!((100..=105).contains(&v));
        }
        assert_eq!(fake.int_in(IntRange::new_unchecked(7, 7)), 7);
    }

    #[test]
    fn test_dates_stay_in_window() {
        let mut fake = fake(3);
        let w = window((2024, 2, 27), (2024, 3, 2));
        for _ in 0..500 {
            assert!(w.contains(fake.date_in(w)));
            let ts = fake.datetime_in(w);
            assert!(w.contains(ts.date()));
        }
    }

    #[test]
    fn test_single_day_window() {
        let mut fake = fake(3);
        let w = window((2024, 5, 1), (2024, 5, 1));
        assert_eq!(fake.date_in(w), w.start());
        assert_eq!(fake.datetime_in(w).date(), w.start());
    }

    #[test]
    fn test_rate_precision_and_bounds() {
        let mut fake = fake(9);
        let range = RateRange { min: 6.5, max: 12.5 };
        for _ in 0..200 {
            let rate = fake.rate_in(range);
            assert_eq!(rate, (rate * 100.0).round() / 100.0);
            assert!((6.5..=12.5).contains(&rate));
        }
        assert_eq!(fake.rate_in(RateRange { min: 7.0, max: 7.0 }), 7.0);
    }

    #[test]
    fn test_sentence_shape() {
        let mut fake = fake(5);
        let sentence = fake.sentence(6);
        assert!(sentence.ends_with('.'));
        assert_eq!(sentence.trim_end_matches('.').split(' ').count(), 6);
        assert!(sentence.chars().next().unwrap().is_uppercase());
    }

    #[test]
    fn test_city_from_fixed_list() {
        let mut fake = fake(13);
        for _ in 0..50 {
            assert!(CITIES.contains(&fake.city()));
        }
    }

    #[test]
    fn test_datetime_covers_whole_last_day() {
        let mut fake = fake(17);
        let w = window((2024, 5, 1), (2024, 5, 1));
        let last = w.end().and_hms_opt(23, 59, 59).unwrap();
        for _ in 0..500 {
            let ts = fake.datetime_in(w);
            assert!(ts >= w.start().and_time(NaiveTime::MIN) && ts <= last);
        }
    }

    #[test]
    fn test_ids_in_range() {
        let mut fake = fake(11);
        for _ in 0..200 {
            let id = fake.id_up_to(3);
            assert!((1..=3).contains(&id));
        }
    }
}
