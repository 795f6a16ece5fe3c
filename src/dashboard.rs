use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info, warn};

use crate::client::DirectoryService;
use crate::error::RequestFailure;
use crate::models::{ListQuery, RiskLevel, SortOption, StudentRecord};

pub const FETCH_FAILED: &str = "Failed to fetch students.";
pub const EVALUATE_FAILED: &str = "Failed to evaluate students.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub risk_filter: Option<RiskLevel>,
    pub sort_option: SortOption,
    pub students: Vec<StudentRecord>,
    pub loading: bool,
    pub error: Option<String>,
    pub evaluating: bool,
    generation: u64,
    evaluation_refresh: Option<u64>,
}

impl DashboardState {
    pub fn new(query: ListQuery) -> Self {
        Self {
            risk_filter: query.risk_level,
            sort_option: query.sort_by,
            ..Self::default()
        }
    }

    pub fn query(&self) -> ListQuery {
        ListQuery::new(self.risk_filter, self.sort_option)
    }

    /// False while an evaluation is running; the evaluate action is disabled.
    pub fn can_evaluate(&self) -> bool {
        !self.evaluating
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    fn issue_fetch(&mut self) -> Effect {
        self.generation += 1;
        self.loading = true;
        Effect::FetchStudents {
            generation: self.generation,
            query: self.query(),
        }
    }
}

/// What the presentation side may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    SetRiskFilter(Option<RiskLevel>),
    SetSortOption(SortOption),
    Refresh,
    Evaluate,
    DismissError,
}

#[derive(Debug)]
pub enum Action {
    Mount,
    Intent(Intent),
    ListSettled {
        generation: u64,
        outcome: Result<Vec<StudentRecord>, RequestFailure>,
    },
    /// Carries the number of records the evaluation touched.
    EvaluationSettled(Result<usize, RequestFailure>),
}

impl From<Intent> for Action {
    fn from(intent: Intent) -> Self {
        Action::Intent(intent)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    FetchStudents { generation: u64, query: ListQuery },
    RunEvaluation,
}

pub fn reduce(mut state: DashboardState, action: Action) -> (DashboardState, Option<Effect>) {
    let effect = match action {
        Action::Mount | Action::Intent(Intent::Refresh) => Some(state.issue_fetch()),
        Action::Intent(Intent::SetRiskFilter(filter)) => {
            if state.risk_filter == filter {
                None
            } else {
                state.risk_filter = filter;
                Some(state.issue_fetch())
            }
        }
        Action::Intent(Intent::SetSortOption(sort)) => {
            if state.sort_option == sort {
                None
            } else {
                state.sort_option = sort;
                Some(state.issue_fetch())
            }
        }
        Action::Intent(Intent::Evaluate) => {
            if state.evaluating {
                None
            } else {
                state.evaluating = true;
                Some(Effect::RunEvaluation)
            }
        }
        Action::Intent(Intent::DismissError) => {
            state.error = None;
            None
        }
        Action::ListSettled {
            generation,
            outcome,
        } => {
            if state.evaluation_refresh == Some(generation) {
                state.evaluation_refresh = None;
                state.evaluating = false;
            }
            if generation == state.generation {
                state.loading = false;
                match outcome {
                    Ok(students) => {
                        state.students = students;
                        state.error = None;
                    }
                    Err(_) => state.error = Some(FETCH_FAILED.to_string()),
                }
            }
            None
        }
        Action::EvaluationSettled(Ok(_)) => {
            state.error = None;
            let effect = state.issue_fetch();
            state.evaluation_refresh = Some(state.generation);
            Some(effect)
        }
        Action::EvaluationSettled(Err(_)) => {
            state.evaluating = false;
            state.error = Some(EVALUATE_FAILED.to_string());
            None
        }
    };
    (state, effect)
}

/// Owns the dashboard state and runs its effects against a directory service
/// on the current task.
pub struct Orchestrator<S> {
    service: Rc<S>,
    state: DashboardState,
    pending: FuturesUnordered<LocalBoxFuture<'static, Action>>,
}

impl<S> Orchestrator<S>
where
    S: DirectoryService + 'static,
{
    pub fn new(service: Rc<S>, query: ListQuery) -> Self {
        Self {
            service,
            state: DashboardState::new(query),
            pending: FuturesUnordered::new(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn dispatch(&mut self, action: impl Into<Action>) {
        let action = action.into();
        self.trace(&action);
        let (next, effect) = reduce(std::mem::take(&mut self.state), action);
        self.state = next;
        if let Some(effect) = effect {
            self.start(effect);
        }
    }

    /// Waits for one in-flight request and applies its result. Returns false
    /// when nothing was in flight.
    pub async fn settle_next(&mut self) -> bool {
        match self.pending.next().await {
            Some(action) => {
                self.dispatch(action);
                true
            }
            None => false,
        }
    }

    pub async fn run_until_idle(&mut self) {
        while self.settle_next().await {}
    }

    fn start(&mut self, effect: Effect) {
        let service = Rc::clone(&self.service);
        let request = match effect {
            Effect::FetchStudents { generation, query } => {
                debug!(generation, ?query, "issuing student list request");
                async move {
                    let outcome = service.list_students(query).await;
                    Action::ListSettled {
                        generation,
                        outcome,
                    }
                }
                .boxed_local()
            }
            Effect::RunEvaluation => {
                info!("starting risk evaluation");
                async move {
                    let outcome = service.evaluate().await.map(|records| records.len());
                    Action::EvaluationSettled(outcome)
                }
                .boxed_local()
            }
        };
        self.pending.push(request);
    }

    fn trace(&self, action: &Action) {
        match action {
            Action::ListSettled {
                generation,
                outcome,
            } => {
                let latest = self.state.latest_generation();
                if *generation != latest {
                    debug!(generation, latest, "discarding superseded student list");
                    return;
                }
                match outcome {
                    Ok(students) => {
                        debug!(generation, count = students.len(), "student list applied")
                    }
                    Err(error) => warn!(generation, %error, "failed to fetch students"),
                }
            }
            Action::EvaluationSettled(Ok(records)) => info!(records, "risk evaluation finished"),
            Action::EvaluationSettled(Err(error)) => warn!(%error, "failed to evaluate students"),
            Action::Intent(Intent::Evaluate) if self.state.evaluating => {
                debug!("evaluation already running, ignoring request")
            }
            _ => {}
        }
    }
}
