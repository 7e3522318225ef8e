//! Listing mutation observers and a composite fan-out.
//!
//! Observers run after a listing write succeeded and react with side effects
//! only: they never fail the submission. Implementations shipped here:
//!
//! - [`CategoryStatsObserver`]: per-category listing counts and price sums
//! - [`AbuseHeuristicObserver`]: burst posting and duplicate title detection

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bazaar_core::category::turkish_lowercase;
use bazaar_core::{ClockSource, Listing};
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::warn;

use crate::service::config::AbuseConfig;

/// Observer for listing mutations.
///
/// Used as `Arc<dyn ListingObserver>`.
pub trait ListingObserver: Send + Sync {
    /// Called after a new listing was fully written.
    fn on_created(&self, listing: &Listing);

    /// Called after an existing listing was replaced.
    fn on_updated(&self, old: &Listing, new: &Listing);

    /// Called after a listing was deleted.
    fn on_removed(&self, listing: &Listing);
}

/// Composite observer that fans out to multiple observers in order.
#[derive(Default)]
pub struct CompositeListingObserver {
    observers: Vec<Arc<dyn ListingObserver>>,
}

impl CompositeListingObserver {
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn ListingObserver>>) -> Self {
        Self { observers }
    }

    pub fn add(&mut self, observer: Arc<dyn ListingObserver>) {
        self.observers.push(observer);
    }
}

impl ListingObserver for CompositeListingObserver {
    fn on_created(&self, listing: &Listing) {
        for observer in &self.observers {
            observer.on_created(listing);
        }
    }

    fn on_updated(&self, old: &Listing, new: &Listing) {
        for observer in &self.observers {
            observer.on_updated(old, new);
        }
    }

    fn on_removed(&self, listing: &Listing) {
        for observer in &self.observers {
            observer.on_removed(listing);
        }
    }
}

/// Aggregate statistics of one category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub listing_count: u64,
    pub price_sum: f64,
}

impl CategoryStats {
    /// Mean price; `None` for an empty category.
    #[must_use]
    // Listing counts stay far below 2^52.
    #[allow(clippy::cast_precision_loss)]
    pub fn average_price(&self) -> Option<f64> {
        (self.listing_count > 0).then(|| self.price_sum / self.listing_count as f64)
    }
}

/// Maintains per-category listing counts and price sums.
#[derive(Default)]
pub struct CategoryStatsObserver {
    stats: DashMap<String, CategoryStats>,
}

impl CategoryStatsObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current statistics of a category; zeroed when it has none.
    #[must_use]
    pub fn snapshot(&self, category_id: &str) -> CategoryStats {
        self.stats.get(category_id).map(|s| *s).unwrap_or_default()
    }

    fn add(&self, listing: &Listing) {
        let mut entry = self.stats.entry(listing.category_id.clone()).or_default();
        entry.listing_count += 1;
        entry.price_sum += listing.price;
    }

    fn subtract(&self, listing: &Listing) {
        if let Some(mut entry) = self.stats.get_mut(&listing.category_id) {
            entry.listing_count = entry.listing_count.saturating_sub(1);
            entry.price_sum -= listing.price;
            if entry.listing_count == 0 {
                entry.price_sum = 0.0;
            }
        }
    }
}

impl ListingObserver for CategoryStatsObserver {
    fn on_created(&self, listing: &Listing) {
        self.add(listing);
    }

    fn on_updated(&self, old: &Listing, new: &Listing) {
        self.subtract(old);
        self.add(new);
    }

    fn on_removed(&self, listing: &Listing) {
        self.subtract(listing);
    }
}

/// Why a listing was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "camelCase")]
pub enum AbuseReason {
    /// The owner created more than the allowed listings inside the window.
    #[serde(rename_all = "camelCase")]
    BurstPosting { count: usize, window_ms: u64 },
    /// The owner already has a listing with the same normalized title.
    DuplicateTitle,
}

/// A listing flagged for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbuseFlag {
    pub listing_id: String,
    pub owner_id: String,
    #[serde(flatten)]
    pub reason: AbuseReason,
    pub flagged_at_ms: u64,
}

#[derive(Default)]
struct OwnerActivity {
    created_at: VecDeque<u64>,
    /// Normalized title -> number of live listings carrying it.
    titles: HashMap<String, usize>,
}

impl OwnerActivity {
    fn expire(&mut self, window_start: u64) {
        while self.created_at.front().is_some_and(|t| *t < window_start) {
            self.created_at.pop_front();
        }
    }

    fn add_title(&mut self, title: String) -> usize {
        let count = self.titles.entry(title).or_insert(0);
        *count += 1;
        *count
    }

    fn remove_title(&mut self, title: &str) {
        if let Some(count) = self.titles.get_mut(title) {
            *count -= 1;
            if *count == 0 {
                self.titles.remove(title);
            }
        }
    }

    fn is_idle(&self) -> bool {
        self.created_at.is_empty() && self.titles.is_empty()
    }
}

#[derive(Default)]
struct OwnerTable {
    owners: HashMap<String, OwnerActivity>,
    last_sweep_ms: u64,
}

impl OwnerTable {
    /// Drops owners with no creations in the window and no live titles.
    /// Runs at most once per window.
    fn sweep(&mut self, now: u64, window_ms: u64) {
        if now.saturating_sub(self.last_sweep_ms) < window_ms {
            return;
        }
        self.last_sweep_ms = now;
        let window_start = now.saturating_sub(window_ms);
        self.owners.retain(|_, activity| {
            activity.expire(window_start);
            !activity.is_idle()
        });
    }

    fn release(&mut self, owner_id: &str, now: u64, window_ms: u64) {
        if let Some(activity) = self.owners.get_mut(owner_id) {
            activity.expire(now.saturating_sub(window_ms));
            if activity.is_idle() {
                self.owners.remove(owner_id);
            }
        }
    }
}

/// Flags burst posting and duplicate titles per owner.
///
/// Flags are collected for review and logged at `warn`; listings are never
/// blocked. Only the newest `max_flags` flags are kept, and owners without
/// recent creations or live titles are forgotten.
pub struct AbuseHeuristicObserver {
    config: AbuseConfig,
    clock: Arc<dyn ClockSource>,
    owners: Mutex<OwnerTable>,
    flags: Mutex<VecDeque<AbuseFlag>>,
}

impl AbuseHeuristicObserver {
    #[must_use]
    pub fn new(config: AbuseConfig, clock: Arc<dyn ClockSource>) -> Self {
        Self {
            config,
            clock,
            owners: Mutex::new(OwnerTable::default()),
            flags: Mutex::new(VecDeque::new()),
        }
    }

    /// Retained flags, oldest first.
    #[must_use]
    pub fn flags(&self) -> Vec<AbuseFlag> {
        self.flags.lock().iter().cloned().collect()
    }

    /// Number of owners currently tracked.
    #[must_use]
    pub fn tracked_owners(&self) -> usize {
        self.owners.lock().owners.len()
    }

    fn raise(&self, listing: &Listing, reason: AbuseReason, now: u64) {
        warn!(
            listing_id = %listing.id,
            owner_id = %listing.owner_id,
            reason = ?reason,
            "Listing flagged by abuse heuristics"
        );
        let mut flags = self.flags.lock();
        flags.push_back(AbuseFlag {
            listing_id: listing.id.clone(),
            owner_id: listing.owner_id.clone(),
            reason,
            flagged_at_ms: now,
        });
        while flags.len() > self.config.max_flags {
            flags.pop_front();
        }
    }
}

/// Lowercased title with punctuation removed and whitespace collapsed.
/// Dotless `ı` folds to `i` so `SLIM` and `Slim` compare equal.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    let lowered = turkish_lowercase(title);
    let cleaned: String = lowered
        .chars()
        .map(|c| match c {
            'ı' => 'i',
            c if c.is_alphanumeric() => c,
            _ => ' ',
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl ListingObserver for AbuseHeuristicObserver {
    fn on_created(&self, listing: &Listing) {
        let now = self.clock.now_ms();
        let title = normalize_title(&listing.title);
        let window_start = now.saturating_sub(self.config.window_ms);

        let (burst, duplicate) = {
            let mut table = self.owners.lock();
            table.sweep(now, self.config.window_ms);
            let activity = table.owners.entry(listing.owner_id.clone()).or_default();
            activity.expire(window_start);
            activity.created_at.push_back(now);
            let burst = activity.created_at.len();
            let duplicate = !title.is_empty() && activity.add_title(title) > 1;
            (burst, duplicate)
        };

        if burst > self.config.max_listings_per_window {
            self.raise(
                listing,
                AbuseReason::BurstPosting {
                    count: burst,
                    window_ms: self.config.window_ms,
                },
                now,
            );
        }
        if duplicate {
            self.raise(listing, AbuseReason::DuplicateTitle, now);
        }
    }

    fn on_updated(&self, old: &Listing, new: &Listing) {
        let old_title = normalize_title(&old.title);
        let new_title = normalize_title(&new.title);
        if old_title == new_title {
            return;
        }
        let now = self.clock.now_ms();
        let mut table = self.owners.lock();
        let activity = table.owners.entry(new.owner_id.clone()).or_default();
        activity.remove_title(&old_title);
        if !new_title.is_empty() {
            activity.add_title(new_title);
        }
        table.release(&new.owner_id, now, self.config.window_ms);
    }

    fn on_removed(&self, listing: &Listing) {
        let title = normalize_title(&listing.title);
        let now = self.clock.now_ms();
        let mut table = self.owners.lock();
        if let Some(activity) = table.owners.get_mut(&listing.owner_id) {
            activity.remove_title(&title);
        }
        table.release(&listing.owner_id, now, self.config.window_ms);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bazaar_core::ManualClock;
    use proptest::prelude::*;

    use super::*;

    fn listing(id: &str, owner: &str, title: &str, category: &str, price: f64) -> Listing {
        Listing {
            id: id.into(),
            owner_id: owner.into(),
            title: title.into(),
            description: String::new(),
            price,
            category_id: category.into(),
            sub_category_id: None,
            image_urls: vec![],
            attributes: Default::default(),
            schema_version: None,
            created_at_ms: 0,
            updated_at_ms: 0,
        }
    }

    #[derive(Default)]
    struct CountingObserver {
        created: AtomicUsize,
        updated: AtomicUsize,
        removed: AtomicUsize,
    }

    impl ListingObserver for CountingObserver {
        fn on_created(&self, _: &Listing) {
            self.created.fetch_add(1, Ordering::Relaxed);
        }
        fn on_updated(&self, _: &Listing, _: &Listing) {
            self.updated.fetch_add(1, Ordering::Relaxed);
        }
        fn on_removed(&self, _: &Listing) {
            self.removed.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[test]
    fn composite_fans_out_to_all_observers() {
        let a = Arc::new(CountingObserver::default());
        let b = Arc::new(CountingObserver::default());
        let mut composite = CompositeListingObserver::new(vec![a.clone() as Arc<dyn ListingObserver>]);
        composite.add(b.clone());

        let l = listing("l1", "u1", "PS5", "konsollar", 100.0);
        composite.on_created(&l);
        composite.on_updated(&l, &l);
        composite.on_removed(&l);

        for observer in [&a, &b] {
            assert_eq!(observer.created.load(Ordering::Relaxed), 1);
            assert_eq!(observer.updated.load(Ordering::Relaxed), 1);
            assert_eq!(observer.removed.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn stats_track_creates_moves_and_removals() {
        let stats = CategoryStatsObserver::new();
        let ps5 = listing("l1", "u1", "PS5", "konsollar", 15_000.0);
        let catan = listing("l2", "u1", "Catan", "kutu-oyunlari", 500.0);
        stats.on_created(&ps5);
        stats.on_created(&catan);

        let snapshot = stats.snapshot("konsollar");
        assert_eq!(snapshot.listing_count, 1);
        assert_eq!(snapshot.average_price(), Some(15_000.0));

        let moved = listing("l1", "u1", "PS5", "kutu-oyunlari", 14_000.0);
        stats.on_updated(&ps5, &moved);
        assert_eq!(stats.snapshot("konsollar"), CategoryStats::default());
        assert_eq!(stats.snapshot("kutu-oyunlari").listing_count, 2);
        assert_eq!(stats.snapshot("kutu-oyunlari").price_sum, 14_500.0);

        stats.on_removed(&catan);
        stats.on_removed(&moved);
        assert_eq!(stats.snapshot("kutu-oyunlari").average_price(), None);
    }

    #[test]
    fn burst_posting_is_flagged_past_the_threshold() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let observer = AbuseHeuristicObserver::new(
            AbuseConfig {
                max_listings_per_window: 2,
                window_ms: 60_000,
                ..AbuseConfig::default()
            },
            clock.clone(),
        );

        observer.on_created(&listing("l1", "u1", "Oyun 1", "c", 1.0));
        clock.advance(1_000);
        observer.on_created(&listing("l2", "u1", "Oyun 2", "c", 1.0));
        assert!(observer.flags().is_empty());

        clock.advance(1_000);
        observer.on_created(&listing("l3", "u1", "Oyun 3", "c", 1.0));
        let flags = observer.flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].listing_id, "l3");
        assert_eq!(
            flags[0].reason,
            AbuseReason::BurstPosting {
                count: 3,
                window_ms: 60_000
            }
        );

        // Outside the window the counter starts over.
        clock.advance(120_000);
        observer.on_created(&listing("l4", "u1", "Oyun 4", "c", 1.0));
        assert_eq!(observer.flags().len(), 1);
    }

    #[test]
    fn duplicate_titles_are_flagged_per_owner() {
        let observer =
            AbuseHeuristicObserver::new(AbuseConfig::default(), Arc::new(ManualClock::new(0)));
        observer.on_created(&listing("l1", "u1", "PS5 Slim, kutulu!", "c", 1.0));
        observer.on_created(&listing("l2", "u2", "PS5 Slim kutulu", "c", 1.0));
        assert!(observer.flags().is_empty());

        observer.on_created(&listing("l3", "u1", "  ps5   SLIM kutulu ", "c", 1.0));
        let flags = observer.flags();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].reason, AbuseReason::DuplicateTitle);
        assert_eq!(flags[0].owner_id, "u1");
    }

    #[test]
    fn removed_or_renamed_titles_can_be_reused() {
        let observer =
            AbuseHeuristicObserver::new(AbuseConfig::default(), Arc::new(ManualClock::new(0)));
        let first = listing("l1", "u1", "Catan", "c", 1.0);
        observer.on_created(&first);
        let renamed = listing("l1", "u1", "Catan Genişleme", "c", 1.0);
        observer.on_updated(&first, &renamed);
        observer.on_created(&listing("l2", "u1", "Catan", "c", 1.0));
        assert!(observer.flags().is_empty());
    }

    #[test]
    fn deleting_one_of_two_same_titled_listings_keeps_the_title() {
        let observer =
            AbuseHeuristicObserver::new(AbuseConfig::default(), Arc::new(ManualClock::new(0)));
        let first = listing("l1", "u1", "Catan", "c", 1.0);
        observer.on_created(&first);
        observer.on_created(&listing("l2", "u1", "Catan", "c", 1.0));
        assert_eq!(observer.flags().len(), 1);

        observer.on_removed(&first);
        observer.on_created(&listing("l3", "u1", "catan", "c", 1.0));
        let flags = observer.flags();
        assert_eq!(flags.len(), 2);
        assert_eq!(flags[1].listing_id, "l3");
        assert_eq!(flags[1].reason, AbuseReason::DuplicateTitle);
    }

    #[test]
    fn only_the_newest_flags_are_kept() {
        let observer = AbuseHeuristicObserver::new(
            AbuseConfig {
                max_flags: 2,
                ..AbuseConfig::default()
            },
            Arc::new(ManualClock::new(0)),
        );
        observer.on_created(&listing("l0", "u1", "Aynı", "c", 1.0));
        for i in 1..=4 {
            observer.on_created(&listing(&format!("l{i}"), "u1", "Aynı", "c", 1.0));
        }
        let ids: Vec<String> = observer.flags().into_iter().map(|f| f.listing_id).collect();
        assert_eq!(ids, vec!["l3", "l4"]);
    }

    #[test]
    fn idle_owners_are_forgotten() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let observer = AbuseHeuristicObserver::new(
            AbuseConfig {
                window_ms: 60_000,
                ..AbuseConfig::default()
            },
            clock.clone(),
        );
        let gone = listing("l1", "u1", "Satıldı", "c", 1.0);
        observer.on_created(&gone);
        observer.on_created(&listing("l2", "u2", "Duruyor", "c", 1.0));
        assert_eq!(observer.tracked_owners(), 2);

        // Removal inside the window keeps the owner for burst counting.
        observer.on_removed(&gone);
        assert_eq!(observer.tracked_owners(), 2);

        // Past the window u1 has nothing left; u2 still has a live title.
        clock.advance(120_000);
        observer.on_created(&listing("l3", "u3", "Yeni", "c", 1.0));
        assert_eq!(observer.tracked_owners(), 2);

        // Removing a listing outside the window evicts its owner at once.
        clock.advance(120_000);
        observer.on_removed(&listing("l3", "u3", "Yeni", "c", 1.0));
        assert_eq!(observer.tracked_owners(), 1);
    }

    #[test]
    fn flag_serializes_flat() {
        let flag = AbuseFlag {
            listing_id: "l1".into(),
            owner_id: "u1".into(),
            reason: AbuseReason::BurstPosting {
                count: 4,
                window_ms: 10,
            },
            flagged_at_ms: 5,
        };
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["reason"], "burstPosting");
        assert_eq!(json["windowMs"], 10);
        assert_eq!(json["listingId"], "l1");
    }

    proptest! {
        #[test]
        fn normalized_titles_ignore_case_spacing_and_punctuation(
            words in proptest::collection::vec("[a-zA-Z0-9]{1,8}", 1..5),
        ) {
            let plain = words.join(" ");
            let noisy = format!("  {}!! ", words.join(" ,  ").to_uppercase());
            prop_assert_eq!(normalize_title(&plain), normalize_title(&noisy));
        }
    }
}
