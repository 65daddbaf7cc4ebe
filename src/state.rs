//! Application state: the activity bank, lesson pools, live run sessions,
//! and the action dispatcher.
//!
//! This module owns:
//!   - the activity store (seed + TOML bank, validated at load)
//!   - the per-lesson word/sentence pools
//!   - run sessions (player state + per-run assembled options)
//!   - the optional progression-service client and the completion slot
//!
//! The engine core stays pure; this is the owned-state-plus-dispatcher shell
//! around the reducer. The completion report is fire-and-forget: the phase
//! transition never waits on the network.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::assembler::{assemble, AssembledOptions};
use crate::config::load_lesson_bank_from_env;
use crate::content::build_steps;
use crate::dimensions::has_negative_dimension;
use crate::domain::{Activity, ActivityKind, LessonPool};
use crate::player::{reduce, Action, PlayerState};
use crate::progression::{BeltLevelResult, CompletionInput, CompletionResult, Progression};
use crate::score::{compute_challenge_score, compute_score};
use crate::seeds::{seed_activities, seed_pool, SEED_LESSON_ID};
use crate::util::now_ms;

/// One live run of one activity.
pub struct RunSession {
    pub id: String,
    pub activity: Arc<Activity>,
    pub pool: Arc<LessonPool>,
    pub player: PlayerState,
    /// Option sets assembled once at run start so the shuffle stays stable.
    pub options: HashMap<String, AssembledOptions>,
    /// Observable slot the completion task writes into; never blocks the run.
    pub completion: Arc<RwLock<Option<CompletionResult>>>,
}

/// A cloneable view of a run, handed to the protocol layer for rendering.
#[derive(Clone)]
pub struct RunView {
    pub run_id: String,
    pub activity: Arc<Activity>,
    pub pool: Arc<LessonPool>,
    pub player: PlayerState,
    pub options: HashMap<String, AssembledOptions>,
}

impl RunSession {
    fn view(&self) -> RunView {
        RunView {
            run_id: self.id.clone(),
            activity: self.activity.clone(),
            pool: self.pool.clone(),
            player: self.player.clone(),
            options: self.options.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub activities: HashMap<String, Arc<Activity>>,
    pub lessons: HashMap<String, Arc<LessonPool>>,
    pub runs: Arc<RwLock<HashMap<String, RunSession>>>,
    pub progression: Option<Progression>,
}

impl AppState {
    /// Build state from env: load the TOML bank, merge the built-in seeds,
    /// and init the progression client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let mut lessons: HashMap<String, Arc<LessonPool>> = HashMap::new();
        lessons.insert(SEED_LESSON_ID.to_string(), Arc::new(seed_pool()));

        let mut activities: HashMap<String, Arc<Activity>> = HashMap::new();

        // Bank activities first; seeds fill in behind without overwriting.
        if let Some(cfg) = load_lesson_bank_from_env() {
            for lesson in cfg.lessons {
                let pool = LessonPool { words: lesson.words, sentences: lesson.sentences };
                lessons.insert(lesson.id, Arc::new(pool));
            }
            for cfg_act in cfg.activities {
                let id = cfg_act.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                let Some(pool) = lessons.get(&cfg_act.lesson) else {
                    error!(target: "activity", activity = %id, lesson = %cfg_act.lesson, "Skipping bank activity: unknown lesson");
                    continue;
                };
                let steps = build_steps(&id, cfg_act.raw_steps(&id), pool);
                if steps.is_empty() {
                    error!(target: "activity", activity = %id, "Skipping bank activity: no playable steps");
                    continue;
                }
                let activity = Activity {
                    id: id.clone(),
                    title: cfg_act.title.clone(),
                    kind: cfg_act.effective_kind(),
                    lesson_id: cfg_act.lesson.clone(),
                    steps,
                    dimensions: cfg_act.dimensions.clone(),
                };
                activities.insert(id, Arc::new(activity));
            }
        }

        for activity in seed_activities() {
            activities.entry(activity.id.clone()).or_insert_with(|| Arc::new(activity));
        }

        // Inventory summary by kind.
        let (mut standard, mut challenge) = (0usize, 0usize);
        for a in activities.values() {
            match a.kind {
                ActivityKind::Standard => standard += 1,
                ActivityKind::Challenge => challenge += 1,
            }
        }
        info!(target: "activity", standard, challenge, lessons = lessons.len(), "Startup activity inventory");

        let progression = Progression::from_env();
        if let Some(p) = &progression {
            info!(target: "kata_backend", base_url = %p.base_url, "Progression service enabled.");
        } else {
            info!(target: "kata_backend", "Progression service disabled (no PROGRESSION_BASE_URL). Using local rewards.");
        }

        Self {
            activities,
            lessons,
            runs: Arc::new(RwLock::new(HashMap::new())),
            progression,
        }
    }

    /// All loaded activities, stable order for listing.
    pub fn list_activities(&self) -> Vec<Arc<Activity>> {
        let mut all: Vec<Arc<Activity>> = self.activities.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Start a fresh run of an activity.
    #[instrument(level = "info", skip(self), fields(%activity_id))]
    pub async fn start_run(&self, activity_id: &str) -> Result<RunView, String> {
        let activity = self
            .activities
            .get(activity_id)
            .cloned()
            .ok_or_else(|| format!("Unknown activityId: {}", activity_id))?;
        let pool = self
            .lessons
            .get(&activity.lesson_id)
            .cloned()
            .unwrap_or_else(|| Arc::new(LessonPool::default()));

        let options: HashMap<String, AssembledOptions> = {
            let mut rng = rand::thread_rng();
            activity
                .steps
                .iter()
                .map(|s| (s.id.clone(), assemble(s, &pool, &mut rng)))
                .collect()
        };

        let run = RunSession {
            id: Uuid::new_v4().to_string(),
            activity: activity.clone(),
            pool,
            player: PlayerState::new(&activity, now_ms()),
            options,
            completion: Arc::new(RwLock::new(None)),
        };
        let view = run.view();
        info!(target: "activity", run = %run.id, activity = %activity.id, steps = activity.steps.len(), "Run started");
        self.runs.write().await.insert(run.id.clone(), run);
        Ok(view)
    }

    /// Read-only snapshot of a run.
    #[instrument(level = "debug", skip(self), fields(%run_id))]
    pub async fn get_run(&self, run_id: &str) -> Result<RunView, String> {
        let runs = self.runs.read().await;
        runs.get(run_id).map(|r| r.view()).ok_or_else(|| format!("Unknown runId: {}", run_id))
    }

    /// Dispatch one action into a run's reducer. When the reduction reports
    /// completion, spawn the fire-and-forget progression call.
    #[instrument(level = "info", skip(self, action), fields(%run_id))]
    pub async fn dispatch(&self, run_id: &str, action: Action) -> Result<RunView, String> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(run_id).ok_or_else(|| format!("Unknown runId: {}", run_id))?;

        let reduced = reduce(run.player.clone(), &run.activity, &run.pool, action, now_ms());
        run.player = reduced.state;

        if let Some(input) = reduced.completion {
            info!(target: "activity", run = %run.id, activity = %run.activity.id, "Run completed; reporting");
            self.spawn_completion(run, input);
        }
        Ok(run.view())
    }

    /// The completion slot for a run, if the report already resolved.
    #[instrument(level = "debug", skip(self), fields(%run_id))]
    pub async fn completion_result(&self, run_id: &str) -> Result<Option<CompletionResult>, String> {
        let slot = {
            let runs = self.runs.read().await;
            runs.get(run_id)
                .map(|r| r.completion.clone())
                .ok_or_else(|| format!("Unknown runId: {}", run_id))?
        };
        let result = slot.read().await.clone();
        Ok(result)
    }

    fn spawn_completion(&self, run: &RunSession, input: CompletionInput) {
        let slot = run.completion.clone();
        let progression = self.progression.clone();
        let fallback = local_completion_result(&run.activity, &run.player);
        let activity_id = run.activity.id.clone();

        tokio::spawn(async move {
            let result = match progression {
                Some(p) => match p.report_completion(&input).await {
                    Ok(r) => r,
                    Err(e) => {
                        error!(target: "activity", activity = %activity_id, error = %e, "Completion report failed; recording degraded completion");
                        CompletionResult::Error
                    }
                },
                None => fallback,
            };
            *slot.write().await = Some(result);
        });
    }
}

/// Rewards computed locally when no progression service is configured, so
/// the completion screen still shows something sensible offline.
fn local_completion_result(activity: &Activity, player: &PlayerState) -> CompletionResult {
    if activity.is_challenge() {
        let successful = !has_negative_dimension(&player.dimensions);
        let score = compute_challenge_score(&player.dimensions, successful);
        CompletionResult::Success {
            belt: BeltLevelResult::default(),
            brain_power: score.brain_power,
            energy_delta: score.energy_delta,
            new_total_bp: score.brain_power,
        }
    } else {
        let score = compute_score(&player.results);
        CompletionResult::Success {
            belt: BeltLevelResult::default(),
            brain_power: score.brain_power,
            energy_delta: score.energy_delta,
            new_total_bp: score.brain_power,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Direction, Phase};
    use crate::score::{BRAIN_POWER_PER_ACTIVITY, STATIC_ACTIVITY_ENERGY};

    #[tokio::test]
    async fn static_story_completes_and_fills_the_slot() {
        let state = AppState::new();
        let view = state.start_run("act-story").await.expect("seed story run");
        assert_eq!(view.player.phase, Phase::Playing);

        let next = Action::NavigateStep { direction: Direction::Next };
        let view = state.dispatch(&view.run_id, next.clone()).await.expect("advance");
        assert_eq!(view.player.current_step_index, 1);
        let view = state.dispatch(&view.run_id, next).await.expect("finish");
        assert_eq!(view.player.phase, Phase::Completed);

        // The slot is written by a spawned task; yield until it lands.
        let mut result = None;
        for _ in 0..200 {
            result = state.completion_result(&view.run_id).await.expect("run exists");
            if result.is_some() {
                break;
            }
            tokio::task::yield_now().await;
        }
        match result.expect("completion slot filled") {
            CompletionResult::Success { brain_power, energy_delta, .. } => {
                assert_eq!(brain_power, BRAIN_POWER_PER_ACTIVITY);
                assert_eq!(energy_delta, STATIC_ACTIVITY_ENERGY);
            }
            other => panic!("expected local success, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_ids_are_reported_not_panicked() {
        let state = AppState::new();
        assert!(state.start_run("act-nope").await.is_err());
        assert!(state.get_run("run-nope").await.is_err());
        assert!(state.dispatch("run-nope", Action::Continue).await.is_err());
    }
}
