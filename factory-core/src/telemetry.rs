//! Simulated live telemetry: random tag values flash with a perturbed reading.

use std::collections::HashMap;
use std::ops::Range;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::registry::{ModuleRegistry, Tag};

/// How long a tag stays flashing after a tick picked it.
pub const FLASH_MS: f64 = 800.0;
/// Range of the tick period, chosen once per started task.
pub const PERIOD_MS: Range<u32> = 300..800;
const MAX_PICKS: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TagRef {
    pub module: String,
    pub tag: String,
}

#[derive(Clone, Debug)]
struct Flash {
    value: String,
    until_ms: f64,
}

pub struct TagFlicker {
    rng: StdRng,
    flashing: HashMap<TagRef, Flash>,
}

impl TagFlicker {
    pub fn new(seed: u64) -> Self {
        TagFlicker {
            rng: StdRng::seed_from_u64(seed),
            flashing: HashMap::new(),
        }
    }

    pub fn next_period_ms(&mut self) -> u32 {
        self.rng.random_range(PERIOD_MS)
    }

    /// Pick 1 to 6 random tags (repeats allowed) and start them flashing.
    /// Returns the tags picked this tick.
    pub fn tick(&mut self, registry: &ModuleRegistry, now_ms: f64) -> Vec<TagRef> {
        self.expire(now_ms);
        let with_tags: Vec<_> = registry.iter().filter(|m| !m.tags.is_empty()).collect();
        if with_tags.is_empty() {
            return Vec::new();
        }
        let picks = self.rng.random_range(1..=MAX_PICKS);
        let mut out = Vec::with_capacity(picks);
        for _ in 0..picks {
            let m = with_tags[self.rng.random_range(0..with_tags.len())];
            let tag = &m.tags[self.rng.random_range(0..m.tags.len())];
            let value = perturb(&tag.value, &mut self.rng);
            let key = TagRef {
                module: m.id.clone(),
                tag: tag.name.clone(),
            };
            self.flashing.insert(
                key.clone(),
                Flash {
                    value,
                    until_ms: now_ms + FLASH_MS,
                },
            );
            out.push(key);
        }
        out
    }

    /// Drop flashes whose window ended at or before `now_ms`.
    pub fn expire(&mut self, now_ms: f64) {
        self.flashing.retain(|_, f| f.until_ms > now_ms);
    }

    /// Whether the flash of `tag` is still running at `now_ms`. A flash ends
    /// `FLASH_MS` after its tick whether or not another tick happened since.
    pub fn is_flashing(&self, module: &str, tag: &str, now_ms: f64) -> bool {
        self.flash(module, tag, now_ms).is_some()
    }

    /// Value to show for `tag` of `module`: the perturbed reading while flashing.
    pub fn display_value<'a>(&'a self, module: &str, tag: &'a Tag, now_ms: f64) -> &'a str {
        self.flash(module, &tag.name, now_ms)
            .map(|f| f.value.as_str())
            .unwrap_or(&tag.value)
    }

    /// Earliest end of a running flash, for scheduling the redraw that clears it.
    pub fn next_expiry_ms(&self) -> Option<f64> {
        self.flashing.values().map(|f| f.until_ms).reduce(f64::min)
    }

    pub fn clear(&mut self) {
        self.flashing.clear();
    }

    fn flash(&self, module: &str, tag: &str, now_ms: f64) -> Option<&Flash> {
        self.flashing
            .get(&TagRef {
                module: module.to_string(),
                tag: tag.to_string(),
            })
            .filter(|f| f.until_ms > now_ms)
    }
}

fn perturb(value: &str, rng: &mut impl Rng) -> String {
    if value.contains('%') {
        if let Some(n) = leading_number(value) {
            let jitter: f64 = rng.random_range(-1.0..1.0);
            return format!("{:.1}%", n + jitter);
        }
    } else if value.contains("units") {
        if let Some(n) = leading_number(value) {
            let jitter = (rng.random_range(0.0..10.0_f64) - 5.0).floor() as i64;
            return format!("{} units", n.trunc() as i64 + jitter);
        }
    }
    value.to_string()
}

/// Longest numeric prefix (after leading whitespace), e.g. `"98.5%" -> 98.5`.
fn leading_number(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    s[..end].parse().ok()
}

/// Holds at most one running task. Starting a new one drops the previous,
/// which is how timer handles cancel themselves.
#[derive(Debug)]
pub struct TaskSlot<T> {
    current: Option<T>,
    generation: u64,
}

impl<T> Default for TaskSlot<T> {
    fn default() -> Self {
        TaskSlot {
            current: None,
            generation: 0,
        }
    }
}

impl<T> TaskSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, task: T) -> u64 {
        if self.current.replace(task).is_some() {
            log::debug!("replaced running task (generation {})", self.generation);
        }
        self.generation += 1;
        self.generation
    }

    pub fn stop(&mut self) {
        self.current = None;
    }

    pub fn is_running(&self) -> bool {
        self.current.is_some()
    }

    /// Incremented by every `start`; lets callbacks detect they belong to a stale task.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<u32>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn tick_flashes_between_one_and_six_tags() {
        let r = ModuleRegistry::builtin();
        let mut f = TagFlicker::new(7);
        for i in 0..50 {
            let now = i as f64 * 1000.0;
            let picked = f.tick(&r, now);
            assert!((1..=6).contains(&picked.len()));
            for p in &picked {
                assert!(f.is_flashing(&p.module, &p.tag, now));
                assert!(r.get(&p.module).unwrap().tags.iter().any(|t| t.name == p.tag));
            }
        }
    }

    #[test]
    fn flashes_expire_after_window() {
        let r = ModuleRegistry::builtin();
        let mut f = TagFlicker::new(1);
        let picked = f.tick(&r, 0.0);
        let p = &picked[0];
        f.expire(FLASH_MS - 1.0);
        assert!(f.is_flashing(&p.module, &p.tag, FLASH_MS - 1.0));
        f.expire(FLASH_MS);
        assert!(!f.is_flashing(&p.module, &p.tag, FLASH_MS));
    }

    #[test]
    fn flash_ends_on_time_without_another_tick() {
        let r = ModuleRegistry::builtin();
        let mut f = TagFlicker::new(1);
        let picked = f.tick(&r, 0.0);
        let p = &picked[0];
        let tag = r.get(&p.module).unwrap().tags.iter().find(|t| t.name == p.tag).unwrap();
        assert_eq!(f.next_expiry_ms(), Some(FLASH_MS));

        assert!(f.is_flashing(&p.module, &p.tag, FLASH_MS - 1.0));
        assert!(!f.is_flashing(&p.module, &p.tag, FLASH_MS));
        assert!(!f.is_flashing(&p.module, &p.tag, 1000.0));
        assert_eq!(f.display_value(&p.module, tag, 1000.0), tag.value);

        f.expire(1000.0);
        assert_eq!(f.next_expiry_ms(), None);
    }

    #[test]
    fn same_seed_same_sequence() {
        let r = ModuleRegistry::builtin();
        let mut a = TagFlicker::new(42);
        let mut b = TagFlicker::new(42);
        assert_eq!(a.next_period_ms(), b.next_period_ms());
        assert_eq!(a.tick(&r, 0.0), b.tick(&r, 0.0));
    }

    #[test]
    fn period_in_range() {
        let mut f = TagFlicker::new(3);
        for _ in 0..100 {
            assert!(PERIOD_MS.contains(&f.next_period_ms()));
        }
    }

    #[test]
    fn perturbation_by_unit() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let pct = perturb("98.5%", &mut rng);
            let n: f64 = pct.trim_end_matches('%').parse().unwrap();
            assert!((97.5..=99.5).contains(&n), "{pct}");
            assert_eq!(pct.split('.').nth(1).map(str::len), Some(2));

            let units = perturb("120 units", &mut rng);
            let n: i64 = units.trim_end_matches(" units").parse().unwrap();
            assert!((115..=124).contains(&n), "{units}");
        }
        assert_eq!(perturb("Running", &mut rng), "Running");
        assert_eq!(perturb("n/a %", &mut rng), "n/a %");
    }

    #[test]
    fn display_value_falls_back_to_tag() {
        let r = ModuleRegistry::builtin();
        let f = TagFlicker::new(0);
        let m = r.get("mes_01").unwrap();
        assert_eq!(f.display_value(&m.id, &m.tags[0], 0.0), m.tags[0].value);
    }

    #[test]
    fn slot_keeps_one_task() {
        let drops = Rc::new(Cell::new(0));
        let mut slot = TaskSlot::new();
        assert_eq!(slot.start(DropCounter(drops.clone())), 1);
        assert_eq!(slot.start(DropCounter(drops.clone())), 2);
        assert_eq!(drops.get(), 1);
        assert!(slot.is_running());
        slot.stop();
        assert_eq!(drops.get(), 2);
        assert!(!slot.is_running());
    }
}
