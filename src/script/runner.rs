//! Script execution against a playlist engine

use super::command::Command;
use crate::engine::PlaylistEngine;
use crate::model::SongId;
use crate::validation::check_consistency;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::io::{BufRead, Write};
use uuid::Uuid;

/// Outcome of one script line, printed as a JSON line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub line: usize,
    pub op: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Counts for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub commands: usize,
    pub failures: usize,
}

/// Feeds script commands to an engine, tracking song labels
pub struct ScriptRunner {
    engine: PlaylistEngine,
    labels: HashMap<String, SongId>,
    check: bool,
}

impl ScriptRunner {
    pub fn new(engine: PlaylistEngine) -> Self {
        Self {
            engine,
            labels: HashMap::new(),
            check: false,
        }
    }

    /// Validate every index after each command, aborting on disagreement
    pub fn with_consistency_checks(mut self, check: bool) -> Self {
        self.check = check;
        self
    }

    pub fn engine(&self) -> &PlaylistEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut PlaylistEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> PlaylistEngine {
        self.engine
    }

    /// Run a whole script, writing one JSON outcome line per command
    pub fn run<R: BufRead, W: Write>(&mut self, reader: R, mut out: W) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        for (index, line) in reader.lines().enumerate() {
            let line = line.context("Failed to read script line")?;
            let Some(outcome) = self.run_line(index + 1, &line)? else {
                continue;
            };

            summary.commands += 1;
            if !outcome.ok {
                summary.failures += 1;
            }
            serde_json::to_writer(&mut out, &outcome).context("Failed to write outcome")?;
            writeln!(out).context("Failed to write outcome")?;
        }

        log::info!(
            "Script finished: {} commands, {} failed",
            summary.commands,
            summary.failures
        );
        Ok(summary)
    }

    /// Run one line; `Ok(None)` for blank or comment lines
    ///
    /// Command failures are reported in the outcome. Only a failed
    /// consistency check is returned as an error.
    pub fn run_line(&mut self, line_no: usize, line: &str) -> Result<Option<Outcome>> {
        let command = match Command::parse_line(line) {
            None => return Ok(None),
            Some(Ok(command)) => command,
            Some(Err(err)) => {
                log::warn!("Line {}: unparseable command: {}", line_no, err);
                return Ok(Some(Outcome {
                    line: line_no,
                    op: "unknown".to_string(),
                    ok: false,
                    result: None,
                    error: Some(format!("parse error: {}", err)),
                }));
            }
        };

        let op = command.op();
        let outcome = match self.execute(&command) {
            Ok(result) => Outcome {
                line: line_no,
                op: op.to_string(),
                ok: true,
                result: Some(result),
                error: None,
            },
            Err(err) => {
                log::warn!("Line {}: {} failed: {:#}", line_no, op, err);
                Outcome {
                    line: line_no,
                    op: op.to_string(),
                    ok: false,
                    result: None,
                    error: Some(format!("{:#}", err)),
                }
            }
        };

        if self.check {
            check_consistency(&self.engine)
                .with_context(|| format!("Consistency check failed after line {} ({})", line_no, op))?;
        }

        Ok(Some(outcome))
    }

    /// Apply a single command
    pub fn execute(&mut self, command: &Command) -> Result<Value> {
        let value = match command {
            Command::Add {
                title,
                artist,
                duration,
                rating,
                label,
            } => {
                let id = self.engine.add_song(title, artist, *duration, *rating)?;
                if let Some(label) = label {
                    self.labels.insert(label.clone(), id);
                }
                json!({ "id": id })
            }
            Command::Remove { song } => {
                let id = self.resolve(song)?;
                to_value(self.engine.remove_song(id)?)?
            }
            Command::RemoveAt { position } => to_value(self.engine.remove_at(*position)?)?,
            Command::Move { song, position } => {
                let id = self.resolve(song)?;
                self.engine.move_song(id, *position)?;
                json!({ "id": id, "position": self.engine.position_of(id)? })
            }
            Command::Reverse => {
                self.engine.reverse();
                json!({ "songs": self.engine.len() })
            }
            Command::Sort { by, algorithm } => {
                self.engine.sort_playlist(*by, *algorithm)?;
                json!({ "by": by, "algorithm": algorithm })
            }
            Command::Rate { song, rating } => {
                let id = self.resolve(song)?;
                self.engine.rate_song(id, *rating)?;
                json!({ "id": id, "rating": rating })
            }
            Command::Edit { song, .. } => {
                let id = self.resolve(song)?;
                let edit = command.song_edit().unwrap_or_default();
                self.engine.edit_song(id, edit)?;
                to_value(self.engine.get_song(id)?)?
            }
            Command::Play { song } => {
                let id = self.resolve(song)?;
                let plays = self.engine.play_song(id)?;
                json!({ "id": id, "play_count": plays })
            }
            Command::Undo => to_value(self.engine.undo_last()?)?,
            Command::Block { artist } => {
                let purged = self.engine.block_artist(artist)?;
                json!({ "artist": artist, "purged": purged })
            }
            Command::Unblock { artist } => {
                json!({ "artist": artist, "was_blocked": self.engine.unblock_artist(artist) })
            }
            Command::QueryRating { rating } => to_value(self.engine.query_by_rating(*rating)?)?,
            Command::QueryRange { min, max } => to_value(self.engine.query_by_rating_range(*min, *max)?)?,
            Command::SearchTitle { title } => to_value(self.engine.search_by_title(title))?,
            Command::Shortest => to_value(self.engine.shortest()?)?,
            Command::Longest => to_value(self.engine.longest()?)?,
            Command::Snapshot => to_value(self.engine.full_snapshot())?,
        };
        Ok(value)
    }

    /// Map a label or id string to a song id
    fn resolve(&self, reference: &str) -> Result<SongId> {
        if let Some(id) = self.labels.get(reference) {
            return Ok(*id);
        }
        Uuid::parse_str(reference)
            .map(SongId::from_uuid)
            .map_err(|_| anyhow!("unknown song reference '{}'", reference))
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize result")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;

    fn run_script(script: &str) -> (ScriptRunner, RunSummary, Vec<Value>) {
        let mut runner = ScriptRunner::new(PlaylistEngine::new(EngineConfig::default()))
            .with_consistency_checks(true);
        let mut out = Vec::new();
        let summary = runner.run(script.as_bytes(), &mut out).unwrap();
        let lines = String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (runner, summary, lines)
    }

    #[test]
    fn test_labels_resolve_across_commands() {
        let script = r#"
# two songs
{"op":"add","title":"One","artist":"A","duration":100,"rating":3,"label":"one"}
{"op":"add","title":"Two","artist":"B","duration":50,"rating":5,"label":"two"}
{"op":"move","song":"two","position":0}
{"op":"play","song":"one"}
{"op":"shortest"}
"#;
        let (runner, summary, lines) = run_script(script);
        assert_eq!(summary, RunSummary { commands: 5, failures: 0 });

        let order: Vec<&str> = runner.engine().iter().map(|s| s.title.as_str()).collect();
        assert_eq!(order, vec!["Two", "One"]);
        assert_eq!(lines[2]["result"]["position"], 0);
        assert_eq!(lines[3]["result"]["play_count"], 1);
        assert_eq!(lines[4]["result"]["title"], "Two");
        assert_eq!(lines[0]["line"], 3);
    }

    #[test]
    fn test_failures_are_reported_not_fatal() {
        let script = r#"{"op":"undo"}
{"op":"remove","song":"ghost"}
{"op":"block","artist":"Spam"}
{"op":"add","title":"T","artist":"Spam","duration":10,"rating":1}
not json
{"op":"add","title":"T","artist":"Ham","duration":10,"rating":1}
"#;
        let (runner, summary, lines) = run_script(script);
        assert_eq!(summary.commands, 6);
        assert_eq!(summary.failures, 4);
        assert_eq!(lines[0]["error"], "nothing to undo");
        assert!(lines[1]["error"].as_str().unwrap().contains("ghost"));
        assert_eq!(lines[3]["error"], "artist 'Spam' is blocked");
        assert_eq!(lines[4]["op"], "unknown");
        assert_eq!(lines[5]["ok"], true);
        assert_eq!(runner.engine().len(), 1);
    }

    #[test]
    fn test_snapshot_command() {
        let script = r#"{"op":"add","title":"A","artist":"X","duration":125,"rating":4}
{"op":"snapshot"}
"#;
        let (_, _, lines) = run_script(script);
        let snapshot = &lines[1]["result"];
        assert_eq!(snapshot["total_songs"], 1);
        assert_eq!(snapshot["rating_distribution"]["4"], 1);
    }
}
