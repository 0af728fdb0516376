use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo_timers::callback::{Interval, Timeout};

use crate::render;
use crate::state::State;
use crate::utils::now_ms;

fn tick(s: &mut State, weak: &Weak<RefCell<State>>) {
    let now = now_ms();
    s.flicker.tick(s.app.registry(), now);
    render::update_tag_values(s);
    schedule_expiry(s, weak.clone());
}

/// Arm a single timeout for the earliest running flash, so rows stop
/// flashing on time even when the next tick is further away.
fn schedule_expiry(s: &mut State, weak: Weak<RefCell<State>>) {
    let Some(until) = s.flicker.next_expiry_ms() else {
        s.flash_expiry = None;
        return;
    };
    let wait = (until - now_ms()).max(0.0).ceil() as u32;
    s.flash_expiry = Some(Timeout::new(wait, move || {
        if let Some(st) = weak.upgrade()
            && let Ok(mut s) = st.try_borrow_mut()
        {
            s.flicker.expire(now_ms());
            render::update_tag_values(&s);
            schedule_expiry(&mut s, weak);
        }
    }));
}

/// (Re)start the telemetry task for the freshly built sidebar. Any running
/// task is dropped first, so there is never more than one interval.
pub fn start(state: &Rc<RefCell<State>>) {
    let weak = Rc::downgrade(state);
    let mut s = state.borrow_mut();
    s.flicker.clear();
    tick(&mut s, &weak);
    let period = s.flicker.next_period_ms();
    let interval = Interval::new(period, move || {
        if let Some(st) = weak.upgrade()
            && let Ok(mut s) = st.try_borrow_mut()
        {
            tick(&mut s, &weak);
        }
    });
    let generation = s.flicker_task.start(interval);
    log::debug!("telemetry task {generation} every {period} ms");
}
