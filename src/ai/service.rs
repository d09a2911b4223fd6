//! AI suggestion service
//!
//! Each request runs on its own worker thread. The worker parks its result
//! in a single shared slot; the main loop polls the slot once per iteration.
//! Every submit bumps a generation counter and results from older requests
//! are dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use super::backend::{AiError, Translator};

/// What came back from the model
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AiOutcome {
    /// A candidate command, ready for confirmation
    Suggestion(String),
    /// The model produced nothing usable
    Empty,
    /// The runtime could not be invoked
    Failed(String),
}

impl AiOutcome {
    fn from_reply(reply: Result<String, AiError>) -> Self {
        match reply {
            Ok(output) => {
                let command = extract_command(&output);
                if command.trim().is_empty() {
                    AiOutcome::Empty
                } else {
                    AiOutcome::Suggestion(command)
                }
            }
            Err(e) => AiOutcome::Failed(e.to_string()),
        }
    }
}

/// Prompt sent to the model for a natural-language request
pub fn build_prompt(request: &str) -> String {
    format!(
        "You are a shell assistant. Produce a single valid bash command \
         (no explanations, no extra text) that matches the user's request.\n\
         User request: {}\nCommand:",
        request
    )
}

/// First non-empty line of the model output, skipping markdown fences.
/// Falls back to the whole output with trailing whitespace removed.
pub fn extract_command(output: &str) -> String {
    let trimmed = output.trim_end();
    trimmed
        .lines()
        .find(|line| !line.is_empty() && !line.trim_start().starts_with("```"))
        .unwrap_or(trimmed)
        .to_string()
}

struct Completion {
    generation: u64,
    outcome: AiOutcome,
}

/// State shared with the worker. `completed.is_some()` is the ready flag.
#[derive(Default)]
struct Exchange {
    generation: u64,
    completed: Option<Completion>,
}

fn lock(exchange: &Mutex<Exchange>) -> MutexGuard<'_, Exchange> {
    exchange.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct AiService {
    translator: Arc<dyn Translator>,
    exchange: Arc<Mutex<Exchange>>,
    worker: Option<JoinHandle<()>>,
}

impl AiService {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self {
            translator,
            exchange: Arc::new(Mutex::new(Exchange::default())),
            worker: None,
        }
    }

    /// Start translating `request`; clears any result not yet picked up.
    /// Returns the request's generation.
    pub fn submit(&mut self, request: &str) -> u64 {
        let generation = {
            let mut exchange = lock(&self.exchange);
            exchange.generation += 1;
            exchange.completed = None;
            exchange.generation
        };

        info!("AI request #{}: {:?}", generation, request);

        let translator = Arc::clone(&self.translator);
        let exchange = Arc::clone(&self.exchange);
        let prompt = build_prompt(request);

        let spawned = thread::Builder::new()
            .name("ai-suggest".to_string())
            .spawn(move || {
                // Blocks for as long as the model takes; the lock is not held
                let outcome = AiOutcome::from_reply(translator.translate(&prompt));
                let mut exchange = lock(&exchange);
                if exchange.generation == generation {
                    exchange.completed = Some(Completion { generation, outcome });
                } else {
                    debug!("Dropping stale AI result #{}", generation);
                }
            });

        match spawned {
            Ok(handle) => self.worker = Some(handle),
            Err(e) => {
                warn!("Failed to start AI worker: {}", e);
                lock(&self.exchange).completed = Some(Completion {
                    generation,
                    outcome: AiOutcome::Failed(e.to_string()),
                });
            }
        }

        generation
    }

    /// Whether a result is waiting
    #[allow(dead_code)]
    pub fn is_ready(&self) -> bool {
        lock(&self.exchange).completed.is_some()
    }

    /// Take the waiting result, clearing the ready flag
    pub fn try_take(&mut self) -> Option<AiOutcome> {
        let completion = {
            let mut exchange = lock(&self.exchange);
            let completion = exchange.completed.take()?;
            if completion.generation != exchange.generation {
                debug!("Dropping stale AI result #{}", completion.generation);
                return None;
            }
            completion
        };

        if let Some(handle) = self.worker.take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                self.worker = Some(handle);
            }
        }

        match &completion.outcome {
            AiOutcome::Suggestion(cmd) => info!("AI result #{}: {:?}", completion.generation, cmd),
            AiOutcome::Empty => info!("AI result #{}: empty", completion.generation),
            AiOutcome::Failed(e) => warn!("AI result #{} failed: {}", completion.generation, e),
        }
        Some(completion.outcome)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io;
    use std::sync::mpsc::{self, Receiver};
    use std::time::{Duration, Instant};

    /// Translator with a fixed answer; `None` fails like a missing runtime
    pub(crate) struct Canned(pub Option<&'static str>);

    impl Translator for Canned {
        fn translate(&self, _prompt: &str) -> Result<String, AiError> {
            match self.0 {
                Some(out) => Ok(out.to_string()),
                None => Err(AiError::Start {
                    program: "ollama".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "not found"),
                }),
            }
        }
    }

    /// Translator that holds the "first" request until the gate opens
    struct Gated(Mutex<Receiver<()>>);

    impl Translator for Gated {
        fn translate(&self, prompt: &str) -> Result<String, AiError> {
            if prompt.contains("User request: first\n") {
                let _ = self.0.lock().unwrap().recv();
                return Ok("echo first".to_string());
            }
            Ok("echo second".to_string())
        }
    }

    pub(crate) fn service(answer: Option<&'static str>) -> AiService {
        AiService::new(Arc::new(Canned(answer)))
    }

    fn wait_take(ai: &mut AiService) -> Option<AiOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if let Some(outcome) = ai.try_take() {
                return Some(outcome);
            }
            thread::sleep(Duration::from_millis(5));
        }
        None
    }

    #[test]
    fn test_extract_command() {
        assert_eq!(extract_command("ls -la\n"), "ls -la");
        assert_eq!(extract_command("\n\nls -la\nexplanation\n"), "ls -la");
        assert_eq!(extract_command("```bash\nls -la\n```\n"), "ls -la");
        assert_eq!(extract_command("  \n"), "");
        assert_eq!(extract_command(""), "");
    }

    #[test]
    fn test_prompt_embeds_request() {
        let prompt = build_prompt("list files");
        assert!(prompt.contains("User request: list files\n"));
        assert!(prompt.ends_with("Command:"));
    }

    #[test]
    fn test_suggestion_round_trip() {
        let mut ai = service(Some("ls -la\n"));
        assert!(!ai.is_ready());
        ai.submit("list files");

        assert_eq!(wait_take(&mut ai), Some(AiOutcome::Suggestion("ls -la".to_string())));
        assert!(!ai.is_ready());
        assert_eq!(ai.try_take(), None);
    }

    #[test]
    fn test_empty_output() {
        let mut ai = service(Some("\n \n"));
        ai.submit("nothing");
        assert_eq!(wait_take(&mut ai), Some(AiOutcome::Empty));
    }

    #[test]
    fn test_runtime_failure_is_not_a_suggestion() {
        let mut ai = service(None);
        ai.submit("list files");
        match wait_take(&mut ai) {
            Some(AiOutcome::Failed(msg)) => assert!(msg.contains("ollama")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_stale_result_dropped() {
        let (gate, rx) = mpsc::channel();
        let mut ai = AiService::new(Arc::new(Gated(Mutex::new(rx))));

        assert_eq!(ai.submit("first"), 1);
        assert_eq!(ai.submit("second"), 2);
        assert_eq!(wait_take(&mut ai), Some(AiOutcome::Suggestion("echo second".to_string())));

        gate.send(()).unwrap();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(ai.try_take(), None);
    }
}
