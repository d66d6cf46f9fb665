//! Draw Orchestrator
//!
//! ```text
//!   Idle ──draw_next──▶ Selecting ──▶ Revealing ──(last winner settles)──▶ Committing ──▶ Idle
//!                                        │  ▲
//!                                        ▼  │ inter-winner pause
//! ```
//!
//! Winners are selected and removed from the pool before the reveal starts.
//! The reveal only dramatizes the result. A draw cancelled mid-reveal is not
//! recorded in history, and its entries stay removed.

use std::collections::HashSet;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crossbeam_channel::Receiver;

use crate::error::{DrawError, DrawResult};
use crate::events::{DrawEvent, EventBus};
use crate::history::{DrawBatch, DrawHistory};
use crate::pool::{DrawMode, Entry, EntryPool};
use crate::prize::{Prize, PrizeId, PrizeList};
use crate::reveal::{RevealAnimator, RevealPhase, RevealPlan};
use crate::selector::select_winners;
use crate::timing::RevealTiming;

/// Orchestrator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawState {
    #[default]
    Idle,
    Selecting,
    Revealing,
    Committing,
}

/// Outcome of a `draw_next` call that was not rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrawStart {
    /// Winners were selected and the reveal began
    Started { prize: String, winners: usize },
    /// A draw is already in flight; nothing changed
    Busy,
}

/// Read model for renderers and persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrawSnapshot {
    pub state: DrawState,
    pub phase: Option<RevealPhase>,
    pub display_value: String,
    pub current_prize_name: String,
    pub remaining_count: usize,
    pub total_count: usize,
    pub history: Vec<DrawBatch>,
    pub digit_width: usize,
    pub mode: DrawMode,
    pub winners_per_prize: usize,
    pub prizes: Vec<Prize>,
    pub revision: u64,
}

/// Persistable engine state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineState {
    pub mode: DrawMode,
    pub all_entries: Vec<Entry>,
    pub remaining_entries: Vec<Entry>,
    pub history: Vec<DrawBatch>,
    pub prizes: Vec<Prize>,
    pub winners_per_prize: usize,
}

impl Default for EngineState {
    fn default() -> Self {
        Self {
            mode: DrawMode::Numeric,
            all_entries: Vec::new(),
            remaining_entries: Vec::new(),
            history: Vec::new(),
            prizes: PrizeList::standard().as_slice().to_vec(),
            winners_per_prize: 1,
        }
    }
}

/// A draw between selection and commit
#[derive(Debug)]
struct InFlight {
    prize_name: String,
    is_final_prize: bool,
    winners: Vec<Entry>,
    index: usize,
    reveal: RevealAnimator,
    /// Set while waiting between two winners of the batch
    pause_until: Option<u64>,
}

impl InFlight {
    fn deadline(&self) -> Option<u64> {
        self.pause_until.or_else(|| self.reveal.next_at())
    }
}

/// Live draw engine
pub struct DrawEngine {
    pool: EntryPool,
    prizes: PrizeList,
    history: DrawHistory,
    winners_per_prize: usize,
    timing: RevealTiming,
    rng: ChaCha8Rng,
    state: DrawState,
    display: String,
    flight: Option<InFlight>,
    events: EventBus,
    revision: u64,
}

impl DrawEngine {
    /// Engine with an empty pool and the standard prizes
    pub fn new() -> Self {
        let pool = EntryPool::empty(DrawMode::Numeric);
        Self {
            display: pool.first_display(),
            pool,
            prizes: PrizeList::standard(),
            history: DrawHistory::new(),
            winners_per_prize: 1,
            timing: RevealTiming::normal(),
            rng: ChaCha8Rng::from_os_rng(),
            state: DrawState::Idle,
            flight: None,
            events: EventBus::new(),
            revision: 0,
        }
    }

    /// Rebuild an engine from persisted state
    pub fn from_state(state: EngineState) -> DrawResult<Self> {
        let mut engine = Self::new();
        engine.restore(state)?;
        Ok(engine)
    }

    /// Seed the selection RNG for reproducible draws
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed(seed);
        self
    }

    pub fn with_timing(mut self, timing: RevealTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Takes effect from the next reveal
    pub fn set_timing(&mut self, timing: RevealTiming) {
        self.timing = timing;
    }

    pub fn subscribe(&mut self) -> Receiver<DrawEvent> {
        self.events.subscribe()
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Replace the pool from a spec string; clears history
    pub fn configure_entries(&mut self, spec: &str, mode: DrawMode) -> DrawResult<()> {
        self.ensure_idle()?;
        let pool = EntryPool::configure(spec, mode).inspect_err(|e| log::warn!("{e}"))?;
        self.install_pool(pool);
        Ok(())
    }

    /// Replace the pool from one-entry-per-line text; clears history
    pub fn import_entries(&mut self, text: &str, mode: DrawMode) -> DrawResult<()> {
        self.ensure_idle()?;
        let pool = EntryPool::from_lines(text, mode).inspect_err(|e| log::warn!("{e}"))?;
        self.install_pool(pool);
        Ok(())
    }

    fn install_pool(&mut self, pool: EntryPool) {
        log::info!(
            "configured {} {} entries (width {})",
            pool.total_count(),
            pool.mode().display_name(),
            pool.width()
        );
        self.pool = pool;
        self.history.clear();
        self.display = self.pool.first_display();
        self.touch();
    }

    /// Replace the prize tiers
    ///
    /// Rejected if the new list is shorter than the number of tiers already
    /// awarded.
    pub fn configure_prizes<I, S>(&mut self, names: I) -> DrawResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_idle()?;
        let prizes = PrizeList::from_names(names)?;
        if prizes.len() < self.history.len() {
            return Err(DrawError::invalid(format!(
                "{} prizes already awarded, cannot shrink to {}",
                self.history.len(),
                prizes.len()
            )));
        }
        log::info!("configured {} prizes", prizes.len());
        self.prizes = prizes;
        self.touch();
        Ok(())
    }

    pub fn add_prize(&mut self, name: &str) -> DrawResult<PrizeId> {
        self.ensure_idle()?;
        let id = self.prizes.add(name)?;
        self.touch();
        Ok(id)
    }

    pub fn remove_prize(&mut self, id: PrizeId) -> DrawResult<Prize> {
        self.ensure_idle()?;
        let prize = self.prizes.remove(id, self.history.len())?;
        self.touch();
        Ok(prize)
    }

    /// Allowed during a draw; the running batch keeps the name it started with
    pub fn rename_prize(&mut self, id: PrizeId, name: &str) -> DrawResult<()> {
        self.prizes.rename(id, name)?;
        self.touch();
        Ok(())
    }

    pub fn set_winners_per_prize(&mut self, n: usize) -> DrawResult<()> {
        self.ensure_idle()?;
        if n == 0 {
            return Err(DrawError::invalid("Winners per prize must be at least 1"));
        }
        self.winners_per_prize = n;
        self.touch();
        Ok(())
    }

    /// Replace all persisted state at once
    pub fn restore(&mut self, state: EngineState) -> DrawResult<()> {
        self.ensure_idle()?;
        if state.winners_per_prize == 0 {
            return Err(DrawError::invalid("Winners per prize must be at least 1"));
        }

        let pool = EntryPool::from_parts(state.all_entries, state.remaining_entries, state.mode)?;
        let history = DrawHistory::from_batches(state.history)?;
        let prizes = PrizeList::from_prizes(state.prizes)?;

        if history.len() > prizes.len() {
            return Err(DrawError::invalid(format!(
                "{} batches recorded for {} prizes",
                history.len(),
                prizes.len()
            )));
        }

        let all: HashSet<&Entry> = pool.all().iter().collect();
        let remaining: HashSet<&Entry> = pool.remaining().iter().collect();
        for entry in history.drawn_entries() {
            if !all.contains(entry) || remaining.contains(entry) {
                return Err(DrawError::invalid(format!(
                    "Drawn entry {entry} is unknown or still remaining"
                )));
            }
        }
        if pool.remaining_count() + history.drawn_count() != pool.total_count() {
            return Err(DrawError::invalid(
                "Entries are neither remaining nor drawn",
            ));
        }

        self.display = pool.first_display();
        self.pool = pool;
        self.history = history;
        self.prizes = prizes;
        self.winners_per_prize = state.winners_per_prize;
        self.touch();
        Ok(())
    }

    pub fn export_state(&self) -> EngineState {
        EngineState {
            mode: self.pool.mode(),
            all_entries: self.pool.all().to_vec(),
            remaining_entries: self.pool.remaining().to_vec(),
            history: self.history.batches().to_vec(),
            prizes: self.prizes.as_slice().to_vec(),
            winners_per_prize: self.winners_per_prize,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DRAW EXECUTION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Select the next batch of winners and start revealing them at `now`
    pub fn draw_next(&mut self, now: u64) -> DrawResult<DrawStart> {
        if self.pool.is_exhausted() {
            log::warn!("draw rejected: pool exhausted");
            return Err(DrawError::ExhaustedPool);
        }
        if self.prizes.is_complete(self.history.len()) {
            log::warn!("draw rejected: all prizes awarded");
            return Err(DrawError::PrizesComplete);
        }
        if self.flight.is_some() {
            log::debug!("draw ignored: already in flight");
            return Ok(DrawStart::Busy);
        }

        self.state = DrawState::Selecting;
        let count = self.winners_per_prize.min(self.pool.remaining_count());
        let winners = select_winners(self.pool.remaining(), count, &mut self.rng);
        if let Err(e) = self.pool.remove(&winners) {
            self.state = DrawState::Idle;
            log::error!("selection produced an unavailable entry: {e}");
            return Err(e);
        }

        let awarded = self.history.len();
        let prize_name = self.prizes.current_name(awarded).to_string();
        let is_final_prize = self.prizes.is_final(awarded);
        log::info!("drawing {count} winner(s) for {prize_name}");
        log::debug!("selected {winners:?}");

        let reveal = self.reveal_for(&winners, 0, is_final_prize, now);
        self.flight = Some(InFlight {
            prize_name: prize_name.clone(),
            is_final_prize,
            winners,
            index: 0,
            reveal,
            pause_until: None,
        });
        self.state = DrawState::Revealing;
        self.touch();
        self.events.emit(DrawEvent::DrawStarted {
            prize: prize_name.clone(),
            count,
        });

        self.advance(now);
        Ok(DrawStart::Started {
            prize: prize_name,
            winners: count,
        })
    }

    fn reveal_for(&self, winners: &[Entry], index: usize, is_final_prize: bool, now: u64) -> RevealAnimator {
        let plan = RevealPlan {
            target: winners[index].clone(),
            mode: self.pool.mode(),
            width: self.pool.width(),
            climax: is_final_prize && index + 1 == winners.len(),
        };
        RevealAnimator::new(plan, self.timing.clone(), now)
    }

    /// When the in-flight draw next needs `advance`
    pub fn next_deadline(&self) -> Option<u64> {
        self.flight.as_ref().and_then(InFlight::deadline)
    }

    /// Process every step due at or before `now`; returns the step count
    pub fn advance(&mut self, now: u64) -> usize {
        let mut steps = 0;
        while let Some(deadline) = self.next_deadline() {
            if deadline > now {
                break;
            }
            self.step(now);
            steps += 1;
        }
        steps
    }

    fn step(&mut self, now: u64) {
        let Some(mut flight) = self.flight.take() else {
            return;
        };

        if flight.pause_until.take().is_some() {
            flight.index += 1;
            flight.reveal = self.reveal_for(&flight.winners, flight.index, flight.is_final_prize, now);
            self.flight = Some(flight);
            return;
        }

        let frame = flight.reveal.step(now, self.pool.all(), &mut self.rng);
        self.display.clone_from(&frame.display);

        if frame.phase == RevealPhase::FakeOut {
            self.events.emit(DrawEvent::FakeOut {
                display: frame.display.clone(),
            });
        } else if frame.pulse {
            self.events.emit(DrawEvent::Tick {
                display: frame.display.clone(),
            });
        }

        if !frame.is_settled() {
            self.flight = Some(flight);
            return;
        }

        self.events.emit(DrawEvent::WinnerRevealed {
            entry: flight.reveal.target().clone(),
            index: flight.index,
            of: flight.winners.len(),
        });

        if flight.index + 1 < flight.winners.len() {
            flight.pause_until = Some(now + self.timing.winner_pause_ms);
            self.flight = Some(flight);
        } else {
            self.commit(flight);
        }
    }

    fn commit(&mut self, flight: InFlight) {
        self.state = DrawState::Committing;
        let batch = DrawBatch::new(flight.prize_name, flight.winners);

        if let Err(e) = self.history.append(batch.clone(), self.prizes.len()) {
            log::error!("could not record batch for {}: {e}", batch.prize_name);
            self.state = DrawState::Idle;
            self.events.emit(DrawEvent::DrawCancelled {
                entries: batch.entries,
            });
            return;
        }

        log::info!(
            "committed {} winner(s) for {}",
            batch.entries.len(),
            batch.prize_name
        );
        self.touch();
        self.events.emit(DrawEvent::BatchCommitted {
            batch,
            is_final_prize: flight.is_final_prize,
        });
        if self.prizes.is_complete(self.history.len()) {
            self.events.emit(DrawEvent::AllPrizesComplete);
        }
        self.state = DrawState::Idle;
    }

    /// Abandon the in-flight draw without recording it
    ///
    /// The selected entries are not returned to the pool.
    pub fn cancel_draw(&mut self) -> Option<Vec<Entry>> {
        let flight = self.flight.take()?;
        self.state = DrawState::Idle;
        log::warn!(
            "draw for {} cancelled; {} entries stay drawn",
            flight.prize_name,
            flight.winners.len()
        );
        self.events.emit(DrawEvent::DrawCancelled {
            entries: flight.winners.clone(),
        });
        Some(flight.winners)
    }

    /// Revert the last committed batch
    pub fn undo(&mut self) -> DrawResult<DrawBatch> {
        self.ensure_idle()?;
        let batch = self.history.pop_last()?;
        if let Err(e) = self.pool.restore(&batch.entries) {
            let prize_count = self.prizes.len();
            let rollback = self.history.append(batch, prize_count);
            debug_assert!(rollback.is_ok(), "re-appending a popped batch cannot overflow");
            return Err(e);
        }

        if let Some(first) = batch.entries.first() {
            self.display = first.to_string();
        }
        log::info!("undid {} winner(s) for {}", batch.entries.len(), batch.prize_name);
        self.touch();
        self.events.emit(DrawEvent::Undone {
            batch: batch.clone(),
        });
        Ok(batch)
    }

    /// Clear history and refill the pool, cancelling any in-flight draw
    pub fn reset(&mut self) {
        self.cancel_draw();
        self.history.clear();
        self.pool.reset();
        self.display = self.pool.first_display();
        self.state = DrawState::Idle;
        log::info!("draw reset");
        self.touch();
        self.events.emit(DrawEvent::Reset);
    }

    fn ensure_idle(&self) -> DrawResult<()> {
        if self.flight.is_some() {
            return Err(DrawError::Busy);
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // READ MODEL
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_some()
    }

    pub fn display_value(&self) -> &str {
        &self.display
    }

    pub fn current_prize_name(&self) -> &str {
        match &self.flight {
            Some(flight) => flight.prize_name.as_str(),
            None => self.prizes.current_name(self.history.len()),
        }
    }

    pub fn pool(&self) -> &EntryPool {
        &self.pool
    }

    pub fn prizes(&self) -> &PrizeList {
        &self.prizes
    }

    pub fn history(&self) -> &DrawHistory {
        &self.history
    }

    pub fn winners_per_prize(&self) -> usize {
        self.winners_per_prize
    }

    pub fn timing(&self) -> &RevealTiming {
        &self.timing
    }

    /// Bumped by every state change worth persisting
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> DrawSnapshot {
        DrawSnapshot {
            state: self.state,
            phase: self.flight.as_ref().map(|f| f.reveal.phase()),
            display_value: self.display.clone(),
            current_prize_name: self.current_prize_name().to_string(),
            remaining_count: self.pool.remaining_count(),
            total_count: self.pool.total_count(),
            history: self.history.batches().to_vec(),
            digit_width: self.pool.width(),
            mode: self.pool.mode(),
            winners_per_prize: self.winners_per_prize,
            prizes: self.prizes.as_slice().to_vec(),
            revision: self.revision,
        }
    }
}

impl Default for DrawEngine {
    fn default() -> Self {
        Self::new()
    }
}
