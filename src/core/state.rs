//! Workflow stages and the transitions between them.
//!
//! Every asynchronous operation is started with a `begin_*` call that hands
//! out a [`Ticket`] and finished with the matching `complete_*` call. Any
//! transition bumps the machine's generation, so a ticket issued before a
//! reset (or any other move) no longer matches and its late result is
//! dropped instead of being written into the newer state.

use crate::core::error::{GenerationError, ValidationError};
use crate::core::i18n::Locale;
use crate::core::model::{PlayerCount, Scenario, Section};

#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
    Idle,
    LoadingIdeas {
        message: String,
    },
    IdeasReady {
        ideas: Vec<String>,
    },
    SelectingLanguage {
        idea: String,
    },
    SelectingPlayerCount {
        idea: String,
        locale: Locale,
    },
    LoadingScenario {
        idea: String,
        locale: Locale,
        player_count: PlayerCount,
        message: String,
    },
    ScenarioReady(ReadyState),
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReadyState {
    pub scenario: Scenario,
    pub locale: Locale,
    pub player_count: PlayerCount,
    /// Section currently being rewritten, if any.
    pub improving: Option<Section>,
    /// Last non-fatal failure, shown without leaving the stage.
    pub notice: Option<String>,
}

impl WorkflowState {
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::LoadingIdeas { .. } => "loading ideas",
            WorkflowState::IdeasReady { .. } => "ideas ready",
            WorkflowState::SelectingLanguage { .. } => "selecting language",
            WorkflowState::SelectingPlayerCount { .. } => "selecting player count",
            WorkflowState::LoadingScenario { .. } => "loading scenario",
            WorkflowState::ScenarioReady(_) => "scenario ready",
            WorkflowState::Error { .. } => "error",
        }
    }

    /// Text to show while a request runs. `None` outside the loading stages.
    pub fn loading_message(&self) -> Option<&str> {
        match self {
            WorkflowState::LoadingIdeas { message } => Some(message),
            WorkflowState::LoadingScenario { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn scenario(&self) -> Option<&Scenario> {
        match self {
            WorkflowState::ScenarioReady(ready) => Some(&ready.scenario),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

#[derive(Debug, Clone)]
pub struct IdeasJob {
    pub ticket: Ticket,
    pub locale: Locale,
}

#[derive(Debug, Clone)]
pub struct ScenarioJob {
    pub ticket: Ticket,
    pub idea: String,
    pub locale: Locale,
    pub player_count: PlayerCount,
}

#[derive(Debug, Clone)]
pub struct ImproveJob {
    pub ticket: Ticket,
    pub section: Section,
    pub original: String,
    pub locale: Locale,
}

#[derive(Debug)]
pub struct WorkflowMachine {
    state: WorkflowState,
    locale: Locale,
    generation: u64,
}

impl WorkflowMachine {
    pub fn new(locale: Locale) -> Self {
        Self {
            state: WorkflowState::Idle,
            locale,
            generation: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Display locale. Follows the language picked for the scenario.
    pub fn locale(&self) -> Locale {
        self.locale
    }

    fn advance(&mut self, next: WorkflowState) {
        self.generation += 1;
        log::debug!("workflow: {} -> {}", self.state.name(), next.name());
        self.state = next;
    }

    fn ticket(&self) -> Ticket {
        Ticket {
            generation: self.generation,
        }
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        if ticket.generation == self.generation {
            true
        } else {
            log::debug!(
                "discarding stale result (ticket {}, now {})",
                ticket.generation,
                self.generation
            );
            false
        }
    }

    fn invalid(&self, action: &'static str) -> ValidationError {
        ValidationError::InvalidTransition {
            stage: self.state.name(),
            action,
        }
    }

    pub fn begin_ideas(&mut self) -> Result<IdeasJob, ValidationError> {
        match self.state {
            WorkflowState::Idle | WorkflowState::IdeasReady { .. } => {
                let message = self.locale.labels().loading_ideas.to_string();
                self.advance(WorkflowState::LoadingIdeas { message });
                Ok(IdeasJob {
                    ticket: self.ticket(),
                    locale: self.locale,
                })
            }
            _ => Err(self.invalid("request ideas")),
        }
    }

    pub fn complete_ideas(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<String>, GenerationError>,
    ) -> bool {
        if !self.is_current(ticket) || !matches!(self.state, WorkflowState::LoadingIdeas { .. }) {
            return false;
        }
        let next = match result {
            Ok(ideas) => WorkflowState::IdeasReady { ideas },
            Err(e) => WorkflowState::Error {
                message: e.to_string(),
            },
        };
        self.advance(next);
        true
    }

    pub fn select_idea(&mut self, index: usize) -> Result<String, ValidationError> {
        let WorkflowState::IdeasReady { ideas } = &self.state else {
            return Err(self.invalid("select an idea"));
        };
        let idea = ideas
            .get(index)
            .cloned()
            .ok_or(ValidationError::IdeaOutOfRange(index))?;
        self.advance(WorkflowState::SelectingLanguage { idea: idea.clone() });
        Ok(idea)
    }

    pub fn select_language(&mut self, locale: Locale) -> Result<(), ValidationError> {
        let WorkflowState::SelectingLanguage { idea } = &self.state else {
            return Err(self.invalid("select a language"));
        };
        let idea = idea.clone();
        self.locale = locale;
        self.advance(WorkflowState::SelectingPlayerCount { idea, locale });
        Ok(())
    }

    pub fn begin_scenario(&mut self, player_count: PlayerCount) -> Result<ScenarioJob, ValidationError> {
        let WorkflowState::SelectingPlayerCount { idea, locale } = &self.state else {
            return Err(self.invalid("generate a scenario"));
        };
        if idea.trim().is_empty() {
            return Err(ValidationError::EmptyIdea);
        }
        let (idea, locale) = (idea.clone(), *locale);
        self.advance(WorkflowState::LoadingScenario {
            idea: idea.clone(),
            locale,
            player_count,
            message: locale.labels().loading_scenario.to_string(),
        });
        Ok(ScenarioJob {
            ticket: self.ticket(),
            idea,
            locale,
            player_count,
        })
    }

    /// Updates the progress text of the loading stage the ticket belongs to.
    pub fn set_loading_message(&mut self, ticket: Ticket, text: String) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        match &mut self.state {
            WorkflowState::LoadingIdeas { message } | WorkflowState::LoadingScenario { message, .. } => {
                *message = text;
                true
            }
            _ => false,
        }
    }

    pub fn complete_scenario(
        &mut self,
        ticket: Ticket,
        result: Result<Scenario, GenerationError>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let WorkflowState::LoadingScenario {
            locale,
            player_count,
            ..
        } = &self.state
        else {
            return false;
        };
        let next = match result {
            Ok(scenario) => WorkflowState::ScenarioReady(ReadyState {
                scenario,
                locale: *locale,
                player_count: *player_count,
                improving: None,
                notice: None,
            }),
            Err(e) => WorkflowState::Error {
                message: e.to_string(),
            },
        };
        self.advance(next);
        true
    }

    pub fn begin_improve(&mut self, section: Section) -> Result<ImproveJob, ValidationError> {
        let WorkflowState::ScenarioReady(ready) = &mut self.state else {
            return Err(self.invalid("improve a section"));
        };
        if ready.improving.is_some() {
            return Err(ValidationError::Busy);
        }
        let original = section.text(&ready.scenario)?.to_string();
        if original.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        ready.improving = Some(section);
        ready.notice = None;
        let locale = ready.locale;
        self.generation += 1;
        Ok(ImproveJob {
            ticket: self.ticket(),
            section,
            original,
            locale,
        })
    }

    pub fn complete_improve(
        &mut self,
        ticket: Ticket,
        section: Section,
        result: Result<String, GenerationError>,
    ) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        let WorkflowState::ScenarioReady(ready) = &mut self.state else {
            return false;
        };
        if ready.improving != Some(section) {
            return false;
        }
        ready.improving = None;
        match result {
            Ok(text) => {
                if let Err(e) = section.replace(&mut ready.scenario, text) {
                    ready.notice = Some(e.to_string());
                }
            }
            Err(e) => {
                log::warn!("improving {:?} failed: {}", section, e);
                ready.notice = Some(format!("{} ({})", ready.locale.labels().improve_failed, e));
            }
        }
        self.generation += 1;
        true
    }

    pub fn retry(&mut self) -> Result<(), ValidationError> {
        match self.state {
            WorkflowState::Error { .. } => {
                self.advance(WorkflowState::Idle);
                Ok(())
            }
            _ => Err(self.invalid("retry")),
        }
    }

    /// Drops ideas, selection and scenario. In-flight work becomes stale.
    pub fn reset(&mut self) {
        self.advance(WorkflowState::Idle);
    }
}
