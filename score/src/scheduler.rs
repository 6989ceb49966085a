//! Runs concurrent timelines against a virtual clock. Each timeline gets its own thread but only
//! one of them holds the baton at a time: whenever the running timeline sleeps, waits or finishes,
//! the baton goes to the timeline with the earliest wake-up, ties broken by the order in which
//! they were scheduled. The clock jumps straight to that wake-up so composing a piece takes no
//! real time and always produces the same events.
use lifesong_core::{Beats, Event, Part, Sound, VoiceId};
use std::{
    cmp::{Ordering, Reverse},
    collections::{BinaryHeap, HashMap},
    mem,
    sync::{
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
        atomic::{self, AtomicBool},
    },
    thread,
};

/// One-shot signal. Once opened it stays open, so waiting on it late returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Latch {
    Go,
    Children,
    End,
}

/// Repeating signal. Syncing waits for the next cue on or after the current beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    NewOctave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Barrier {
    Latch(Latch),
    Cue(Cue),
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("{part} is waiting on {barrier:?} at {at} but no other timeline can release it")]
    Stalled {
        part: Part,
        barrier: Barrier,
        at: Beats,
    },
    #[error("{0} panicked")]
    Panicked(Part),
}

/// Written once by one timeline and polled by another.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, atomic::Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(atomic::Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct TaskId(u64);

#[derive(Debug, Clone, Copy)]
struct Wake {
    at: Beats,
    seq: u64,
    task: TaskId,
}

impl Ord for Wake {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .as_f64()
            .total_cmp(&other.at.as_f64())
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Wake {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Wake {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Wake {}

#[derive(Default)]
struct State {
    now: Beats,
    running: Option<TaskId>,
    ready: BinaryHeap<Reverse<Wake>>,
    blocked: HashMap<TaskId, Barrier>,
    stalled: HashMap<TaskId, Barrier>,
    opened: HashMap<Latch, Beats>,
    last_cue: HashMap<Cue, Beats>,
    next_seq: u64,
    next_task: u64,
    next_voice: u32,
    live: usize,
    events: Vec<Event>,
    errors: Vec<anyhow::Error>,
    handles: Vec<thread::JoinHandle<()>>,
}

impl State {
    fn schedule(&mut self, task: TaskId, at: Beats) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.ready.push(Reverse(Wake { at, seq, task }));
    }

    fn release(&mut self, barrier: Barrier) {
        let mut released = self
            .blocked
            .iter()
            .filter(|&(_, &b)| b == barrier)
            .map(|(&task, _)| task)
            .collect::<Vec<_>>();
        released.sort();
        let now = self.now;
        for task in released {
            self.blocked.remove(&task);
            self.schedule(task, now);
        }
    }

    fn dispatch(&mut self) {
        if self.ready.is_empty() && !self.blocked.is_empty() {
            // Everyone left is waiting on everyone else. Wake them up so their waits fail rather
            // than leaving the run hanging forever.
            let mut stalled = self.blocked.drain().collect::<Vec<_>>();
            stalled.sort_by_key(|&(task, _)| task);
            let now = self.now;
            for (task, barrier) in stalled {
                self.stalled.insert(task, barrier);
                self.schedule(task, now);
            }
        }
        match self.ready.pop() {
            Some(Reverse(wake)) => {
                self.now = wake.at;
                self.running = Some(wake.task);
            }
            None => self.running = None,
        }
    }
}

struct Shared {
    state: Mutex<State>,
    baton: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn wait_for_baton<'a>(
        &self,
        state: MutexGuard<'a, State>,
        task: TaskId,
    ) -> MutexGuard<'a, State> {
        self.baton
            .wait_while(state, |state| state.running != Some(task))
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn pass_baton<'a>(
        &self,
        mut state: MutexGuard<'a, State>,
        task: TaskId,
    ) -> MutexGuard<'a, State> {
        state.dispatch();
        self.baton.notify_all();
        self.wait_for_baton(state, task)
    }
}

/// Handle through which a timeline reads the clock, emits sounds and synchronizes with the other
/// timelines.
pub struct Timeline {
    shared: Arc<Shared>,
    task: TaskId,
    part: Part,
}

impl Timeline {
    pub fn part(&self) -> Part {
        self.part
    }

    pub fn now(&self) -> Beats {
        self.shared.lock().now
    }

    /// Negative durations are treated as 0.
    pub fn sleep(&self, beats: Beats) {
        let mut state = self.shared.lock();
        let at = state.now + beats.max(Beats::ZERO);
        state.schedule(self.task, at);
        drop(self.shared.pass_baton(state, self.task));
    }

    pub fn emit(&self, sound: Sound) {
        let mut state = self.shared.lock();
        let at = state.now;
        state.events.push(Event {
            at,
            part: self.part,
            sound,
        });
    }

    pub fn new_voice(&self) -> VoiceId {
        let mut state = self.shared.lock();
        let voice = VoiceId(state.next_voice);
        state.next_voice += 1;
        voice
    }

    pub fn open(&self, latch: Latch) {
        let mut state = self.shared.lock();
        if !state.opened.contains_key(&latch) {
            let now = state.now;
            state.opened.insert(latch, now);
            state.release(Barrier::Latch(latch));
        }
    }

    pub fn wait(&self, latch: Latch) -> Result<(), ScheduleError> {
        let state = self.shared.lock();
        if state.opened.contains_key(&latch) {
            Ok(())
        } else {
            self.block(state, Barrier::Latch(latch))
        }
    }

    pub fn cue(&self, cue: Cue) {
        let mut state = self.shared.lock();
        let now = state.now;
        state.last_cue.insert(cue, now);
        state.release(Barrier::Cue(cue));
    }

    pub fn sync(&self, cue: Cue) -> Result<(), ScheduleError> {
        let state = self.shared.lock();
        if state.last_cue.get(&cue) == Some(&state.now) {
            Ok(())
        } else {
            self.block(state, Barrier::Cue(cue))
        }
    }

    fn block(
        &self,
        mut state: MutexGuard<'_, State>,
        barrier: Barrier,
    ) -> Result<(), ScheduleError> {
        state.blocked.insert(self.task, barrier);
        let mut state = self.shared.pass_baton(state, self.task);
        match state.stalled.remove(&self.task) {
            Some(barrier) => Err(ScheduleError::Stalled {
                part: self.part,
                barrier,
                at: state.now,
            }),
            None => Ok(()),
        }
    }

    /// Starts another timeline at the current beat. It first runs when this one next yields.
    pub fn spawn<F>(&self, part: Part, f: F) -> anyhow::Result<()>
    where
        F: FnOnce(&Timeline) -> anyhow::Result<()> + Send + 'static,
    {
        spawn(&self.shared, part, f)
    }
}

fn spawn<F>(shared: &Arc<Shared>, part: Part, f: F) -> anyhow::Result<()>
where
    F: FnOnce(&Timeline) -> anyhow::Result<()> + Send + 'static,
{
    let mut state = shared.lock();
    let task = TaskId(state.next_task);
    state.next_task += 1;
    let timeline = Timeline {
        shared: Arc::clone(shared),
        task,
        part,
    };
    let handle = thread::Builder::new()
        .name(part.to_string())
        .spawn(move || run_timeline(timeline, f))?;
    state.live += 1;
    let now = state.now;
    state.schedule(task, now);
    state.handles.push(handle);
    Ok(())
}

/// Gives up the baton when a timeline ends, including by panicking.
struct Finish<'a>(&'a Timeline);

impl Drop for Finish<'_> {
    fn drop(&mut self) {
        let timeline = self.0;
        let mut state = timeline.shared.lock();
        if thread::panicking() {
            state
                .errors
                .push(ScheduleError::Panicked(timeline.part).into());
        }
        log::debug!("{} ends at {}", timeline.part, state.now);
        state.live -= 1;
        state.blocked.remove(&timeline.task);
        state.stalled.remove(&timeline.task);
        if state.running == Some(timeline.task) {
            state.dispatch();
        }
        timeline.shared.baton.notify_all();
    }
}

fn run_timeline<F>(timeline: Timeline, f: F)
where
    F: FnOnce(&Timeline) -> anyhow::Result<()>,
{
    let finish = Finish(&timeline);
    {
        let state = timeline.shared.lock();
        let state = timeline.shared.wait_for_baton(state, timeline.task);
        log::debug!("{} starts at {}", timeline.part, state.now);
    }
    if let Err(e) = f(&timeline) {
        let e = e.context(format!("{} failed", timeline.part));
        timeline.shared.lock().errors.push(e);
    }
    drop(finish);
}

/// Runs `main` as the main timeline starting on beat 0 and returns every emitted event once all
/// timelines have finished. Fails with the first error raised by any timeline.
pub fn run<F>(main: F) -> anyhow::Result<Vec<Event>>
where
    F: FnOnce(&Timeline) -> anyhow::Result<()> + Send + 'static,
{
    let shared = Arc::new(Shared {
        state: Mutex::new(State::default()),
        baton: Condvar::new(),
    });
    spawn(&shared, Part::Main, main)?;
    let handles = {
        let mut state = shared.lock();
        state.dispatch();
        shared.baton.notify_all();
        let mut state = shared
            .baton
            .wait_while(state, |state| state.live > 0)
            .unwrap_or_else(PoisonError::into_inner);
        mem::take(&mut state.handles)
    };
    for handle in handles {
        // A panic has already been recorded by the timeline that panicked.
        let _ = handle.join();
    }
    let mut state = shared.lock();
    let mut errors = mem::take(&mut state.errors).into_iter();
    match errors.next() {
        Some(first) => {
            for other in errors {
                log::warn!("{:#}", other);
            }
            Err(first)
        }
        None => Ok(mem::take(&mut state.events)),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use lifesong_core::SampleName;

    fn tick(timeline: &Timeline) {
        timeline.emit(Sound::Sample {
            name: SampleName::ElecTick,
            amp: 1.0,
            pan: 0.0,
        });
    }

    fn onsets(events: &[Event], part: Part) -> Vec<f64> {
        events
            .iter()
            .filter(|event| event.part == part)
            .map(|event| event.at.as_f64())
            .collect()
    }

    #[test]
    fn sleeps_advance_the_virtual_clock() {
        let events = run(|tl| {
            tick(tl);
            tl.sleep(Beats(2.0));
            tick(tl);
            tl.sleep(Beats(-3.0));
            tick(tl);
            Ok(())
        })
        .unwrap();
        assert_eq!(onsets(&events, Part::Main), [0.0, 2.0, 2.0]);
    }

    #[test]
    fn concurrent_timelines_interleave_chronologically() {
        let events = run(|tl| {
            tl.spawn(Part::Ticks, |tl| {
                for _ in 0..3 {
                    tick(tl);
                    tl.sleep(Beats(2.0));
                }
                Ok(())
            })?;
            tl.sleep(Beats(1.0));
            for _ in 0..3 {
                tick(tl);
                tl.sleep(Beats(2.0));
            }
            Ok(())
        })
        .unwrap();
        let all = events.iter().map(|e| e.at.as_f64()).collect::<Vec<_>>();
        assert_eq!(all, [0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(onsets(&events, Part::Ticks), [0.0, 2.0, 4.0]);
    }

    #[test]
    fn spawned_timeline_starts_at_the_parents_beat() {
        let events = run(|tl| {
            tl.sleep(Beats(7.0));
            tl.spawn(Part::Weddings, |tl| {
                tick(tl);
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
        assert_eq!(onsets(&events, Part::Weddings), [7.0]);
    }

    #[test]
    fn latch_releases_waiters_and_stays_open() {
        let events = run(|tl| {
            tl.spawn(Part::Ticks, |tl| {
                tl.wait(Latch::Go)?;
                tick(tl);
                Ok(())
            })?;
            tl.sleep(Beats(4.0));
            tl.open(Latch::Go);
            tl.sleep(Beats(3.0));
            // already open, so no waiting
            tl.wait(Latch::Go)?;
            tick(tl);
            Ok(())
        })
        .unwrap();
        assert_eq!(onsets(&events, Part::Ticks), [4.0]);
        assert_eq!(onsets(&events, Part::Main), [7.0]);
    }

    #[test]
    fn sync_sees_a_cue_on_the_same_beat_in_either_order() {
        let events = run(|tl| {
            tl.spawn(Part::Ticks, |tl| {
                tl.sleep(Beats(5.0));
                tl.cue(Cue::NewOctave);
                tl.sleep(Beats(5.0));
                tl.cue(Cue::NewOctave);
                Ok(())
            })?;
            // runs after the cue on beat 5
            tl.spawn(Part::ShepardTone, |tl| {
                tl.sleep(Beats(5.0));
                tl.sync(Cue::NewOctave)?;
                tick(tl);
                Ok(())
            })?;
            // syncs before the cue on beat 5
            tl.sleep(Beats(5.0));
            tl.sync(Cue::NewOctave)?;
            tick(tl);
            Ok(())
        })
        .unwrap();
        assert_eq!(onsets(&events, Part::ShepardTone), [5.0]);
        assert_eq!(onsets(&events, Part::Main), [5.0]);
    }

    #[test]
    fn sync_ignores_earlier_cues() {
        let result = run(|tl| {
            tl.cue(Cue::NewOctave);
            tl.sleep(Beats(1.0));
            tl.sync(Cue::NewOctave)?;
            Ok(())
        });
        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ScheduleError>(),
            Some(ScheduleError::Stalled {
                part: Part::Main,
                barrier: Barrier::Cue(Cue::NewOctave),
                ..
            })
        ));
    }

    #[test]
    fn waiting_on_a_latch_nobody_opens_fails_instead_of_hanging() {
        let result = run(|tl| {
            tl.spawn(Part::Ticks, |tl| {
                tl.wait(Latch::End)?;
                Ok(())
            })?;
            tl.wait(Latch::Children)?;
            Ok(())
        });
        assert!(result.is_err());
    }

    #[test]
    fn timeline_errors_fail_the_run() {
        let result = run(|tl| {
            tl.spawn(Part::Divorces, |_| anyhow::bail!("bad divorce"))?;
            tl.sleep(Beats(1.0));
            Ok(())
        });
        let message = format!("{:#}", result.unwrap_err());
        assert!(message.contains("bad divorce"), "{}", message);
    }

    #[test]
    fn panics_are_reported() {
        let result = run(|tl| {
            tl.spawn(Part::Weddings, |_| panic!("boom"))?;
            tl.sleep(Beats(1.0));
            tick(tl);
            Ok(())
        });
        let error = result.unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ScheduleError>(),
            Some(ScheduleError::Panicked(Part::Weddings))
        ));
    }

    #[test]
    fn voices_are_numbered_in_order() {
        let events = run(|tl| {
            let a = tl.new_voice();
            let b = tl.new_voice();
            assert_eq!((a, b), (VoiceId(0), VoiceId(1)));
            Ok(())
        })
        .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn stop_flag_is_shared_between_clones() {
        let flag = StopFlag::new();
        let other = flag.clone();
        assert!(!other.is_stopped());
        flag.stop();
        assert!(other.is_stopped());
    }
}
