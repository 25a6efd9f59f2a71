use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::crumbs::{BreadcrumbCsvWriter, BreadcrumbError, ExtractedBreadcrumb};
use crate::MissingInputError;

use super::lexer::{tokenize, SyntaxError};
use super::scene::{walk_layer, SampleValue, SceneVisitor};

pub const DEFAULT_CHUNK_SIZE: usize = 200;

const BREADCRUMBS_SCOPE: &str = "/players/breadcrumbs/match_";
const PLAYER_PREFIX: &str = "player_";
const MATCH_PREFIX: &str = "match_";
const TRANSLATE_ATTRIBUTE: &str = "xformOp:translate";
const LIFE_ATTRIBUTE: &str = "primvars:life";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    MissingInput(#[from] MissingInputError),
    #[error("failed to read scene {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error in {path} line {line}: {message}")]
    Syntax {
        path: PathBuf,
        line: usize,
        message: String,
    },
    #[error("no player prims matching /players/breadcrumbs/match_<id>/player_<id> in {path}")]
    NoPlayers { path: PathBuf },
    #[error("chunk size must be at least 1")]
    ZeroChunkSize,
    #[error(transparent)]
    Write(#[from] BreadcrumbError),
}

/// Destination for extracted rows. `flush` marks the end of a chunk.
pub trait BreadcrumbSink {
    fn write_row(&mut self, row: &ExtractedBreadcrumb) -> Result<(), BreadcrumbError>;

    fn flush(&mut self) -> Result<(), BreadcrumbError>;
}

impl BreadcrumbSink for BreadcrumbCsvWriter {
    fn write_row(&mut self, row: &ExtractedBreadcrumb) -> Result<(), BreadcrumbError> {
        self.write(row)
    }

    fn flush(&mut self) -> Result<(), BreadcrumbError> {
        BreadcrumbCsvWriter::flush(self)
    }
}

impl BreadcrumbSink for Vec<ExtractedBreadcrumb> {
    fn write_row(&mut self, row: &ExtractedBreadcrumb) -> Result<(), BreadcrumbError> {
        self.push(row.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BreadcrumbError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub players_found: usize,
    pub players_written: usize,
    pub players_skipped: usize,
    pub rows_written: usize,
    pub chunks_flushed: usize,
}

/// Reads a USD ASCII layer and writes its player breadcrumbs to `out_path`.
/// The output file only appears once extraction succeeded.
pub fn extract_breadcrumbs(
    usda_path: &Path,
    out_path: &Path,
    chunk_size: usize,
) -> Result<ExtractSummary, ExtractError> {
    if !usda_path.is_file() {
        return Err(MissingInputError::new("usd scene", usda_path).into());
    }
    let source = fs::read_to_string(usda_path).map_err(|source| ExtractError::Read {
        path: usda_path.to_path_buf(),
        source,
    })?;
    info!(
        usda_path = %usda_path.display(),
        out_path = %out_path.display(),
        chunk_size,
        "breadcrumb_extraction_started"
    );

    let mut writer = BreadcrumbCsvWriter::create(out_path)?;
    let summary = extract_from_source(&source, usda_path, &mut writer, chunk_size)?;
    writer.finish()?;
    info!(
        players_written = summary.players_written,
        players_skipped = summary.players_skipped,
        rows_written = summary.rows_written,
        out_path = %out_path.display(),
        "breadcrumb_extraction_complete"
    );
    Ok(summary)
}

/// `origin` only labels errors.
pub fn extract_from_source<S: BreadcrumbSink>(
    source: &str,
    origin: &Path,
    sink: &mut S,
    chunk_size: usize,
) -> Result<ExtractSummary, ExtractError> {
    if chunk_size == 0 {
        return Err(ExtractError::ZeroChunkSize);
    }
    let syntax_err = |error: SyntaxError| ExtractError::Syntax {
        path: origin.to_path_buf(),
        line: error.line,
        message: error.message,
    };
    let tokens = tokenize(source).map_err(syntax_err)?;

    let mut collector = PlayerCollector {
        sink,
        chunk_size,
        current: None,
        players_in_chunk: 0,
        summary: ExtractSummary::default(),
    };
    walk_layer(&tokens, &mut collector).map_err(|error| match error {
        CollectError::Syntax(error) => syntax_err(error),
        CollectError::Write(error) => ExtractError::Write(error),
    })?;

    let PlayerCollector {
        sink,
        players_in_chunk,
        mut summary,
        ..
    } = collector;
    if summary.players_found == 0 {
        return Err(ExtractError::NoPlayers {
            path: origin.to_path_buf(),
        });
    }
    if players_in_chunk > 0 {
        sink.flush()?;
        summary.chunks_flushed += 1;
    }
    Ok(summary)
}

#[derive(Debug)]
enum CollectError {
    Syntax(SyntaxError),
    Write(BreadcrumbError),
}

impl From<SyntaxError> for CollectError {
    fn from(error: SyntaxError) -> Self {
        Self::Syntax(error)
    }
}

impl From<BreadcrumbError> for CollectError {
    fn from(error: BreadcrumbError) -> Self {
        Self::Write(error)
    }
}

#[derive(Debug)]
struct PlayerPrim {
    path: String,
    match_id: i64,
    player_id: i64,
    translate: Option<Vec<(f64, SampleValue)>>,
    life: Option<Vec<(f64, SampleValue)>>,
    life_default: Option<SampleValue>,
}

struct PlayerCollector<'s, S> {
    sink: &'s mut S,
    chunk_size: usize,
    current: Option<PlayerPrim>,
    players_in_chunk: usize,
    summary: ExtractSummary,
}

impl<S: BreadcrumbSink> SceneVisitor for PlayerCollector<'_, S> {
    type Error = CollectError;

    fn open_prim(&mut self, path: &str) -> Result<(), CollectError> {
        if self.current.is_some() {
            return Ok(());
        }
        if let Some((match_id, player_id)) = player_ids(path) {
            self.current = Some(PlayerPrim {
                path: path.to_string(),
                match_id,
                player_id,
                translate: None,
                life: None,
                life_default: None,
            });
        }
        Ok(())
    }

    fn time_samples(
        &mut self,
        prim_path: &str,
        attribute: &str,
        samples: Vec<(f64, SampleValue)>,
    ) -> Result<(), CollectError> {
        let Some(player) = self.current.as_mut().filter(|player| player.path == prim_path) else {
            return Ok(());
        };
        match attribute {
            TRANSLATE_ATTRIBUTE => player.translate = Some(samples),
            LIFE_ATTRIBUTE => player.life = Some(samples),
            _ => {}
        }
        Ok(())
    }

    fn default_value(
        &mut self,
        prim_path: &str,
        attribute: &str,
        value: SampleValue,
    ) -> Result<(), CollectError> {
        if let Some(player) = self.current.as_mut().filter(|player| player.path == prim_path) {
            if attribute == LIFE_ATTRIBUTE {
                player.life_default = Some(value);
            }
        }
        Ok(())
    }

    fn close_prim(&mut self, path: &str) -> Result<(), CollectError> {
        if !self.current.as_ref().is_some_and(|player| player.path == path) {
            return Ok(());
        }
        let Some(player) = self.current.take() else {
            return Ok(());
        };
        self.summary.players_found += 1;
        info!(
            player = self.summary.players_found,
            path = %player.path,
            "player_processing"
        );

        match player_rows(&player) {
            Ok(PlayerRows { rows, merged_samples }) => {
                if merged_samples > 0 {
                    warn!(
                        path = %player.path,
                        merged_samples,
                        "player_time_codes_merged"
                    );
                }
                for row in &rows {
                    self.sink.write_row(row)?;
                }
                self.summary.rows_written += rows.len();
                self.summary.players_written += 1;
            }
            Err(reason) => {
                warn!(path = %player.path, reason = %reason, "player_skipped");
                self.summary.players_skipped += 1;
            }
        }

        self.players_in_chunk += 1;
        if self.players_in_chunk == self.chunk_size {
            self.sink.flush()?;
            self.players_in_chunk = 0;
            self.summary.chunks_flushed += 1;
            debug!(
                players_found = self.summary.players_found,
                rows_written = self.summary.rows_written,
                "breadcrumb_chunk_flushed"
            );
        }
        Ok(())
    }
}

/// Match and player ids for a player prim path, `-1` where the digits are
/// missing. `None` when the prim is not a player.
fn player_ids(path: &str) -> Option<(i64, i64)> {
    if !path.contains(BREADCRUMBS_SCOPE) {
        return None;
    }
    let name = path.rsplit('/').next()?;
    let player_digits = name.strip_prefix(PLAYER_PREFIX)?;
    let match_id = path
        .split('/')
        .find_map(|component| component.strip_prefix(MATCH_PREFIX))
        .map_or(-1, leading_id);
    Some((match_id, leading_id(player_digits)))
}

fn leading_id(text: &str) -> i64 {
    let digits = text
        .chars()
        .take_while(|ch| ch.is_ascii_digit())
        .collect::<String>();
    digits.parse().unwrap_or(-1)
}

/// Life as an attribute read at a given time code would resolve it. `None`
/// is a blocked value.
#[derive(Debug)]
enum LifeTrack {
    Sampled(Vec<(f64, Option<f64>)>),
    Constant(Option<f64>),
}

impl LifeTrack {
    fn from_player(player: &PlayerPrim) -> Result<Self, String> {
        let scalar = |time: Option<f64>, value: &SampleValue| match value {
            SampleValue::None => Ok(None),
            SampleValue::Scalar(v) => Ok(Some(*v)),
            _ => Err(match time {
                Some(time) => format!("{LIFE_ATTRIBUTE} sample at {time} is not a scalar"),
                None => format!("{LIFE_ATTRIBUTE} default is not a scalar"),
            }),
        };

        let authored = player.life.as_deref().unwrap_or_default();
        if !authored.is_empty() {
            let mut samples = authored
                .iter()
                .map(|(time, value)| scalar(Some(*time), value).map(|life| (*time, life)))
                .collect::<Result<Vec<_>, String>>()?;
            samples.sort_by(|(a, _), (b, _)| a.total_cmp(b));
            // A repeated time code keeps its last authored value.
            samples.dedup_by(|later, earlier| {
                let same = later.0 == earlier.0;
                if same {
                    *earlier = *later;
                }
                same
            });
            return Ok(Self::Sampled(samples));
        }
        match &player.life_default {
            Some(value) => Ok(Self::Constant(scalar(None, value)?)),
            None => Err(format!("missing {LIFE_ATTRIBUTE} value")),
        }
    }

    /// Exact samples win, neighbours interpolate linearly, values before the
    /// first or after the last sample are held. A blocked lower neighbour
    /// blocks; a blocked upper neighbour holds the lower value.
    fn at(&self, time: f64) -> Option<f64> {
        let samples = match self {
            Self::Constant(value) => return *value,
            Self::Sampled(samples) => samples,
        };
        let upper = samples.partition_point(|(t, _)| *t < time);
        let lower = upper.checked_sub(1).and_then(|idx| samples.get(idx));
        match (lower, samples.get(upper)) {
            (_, Some(&(t, value))) if t == time => value,
            (None, Some(&(_, value))) | (Some(&(_, value)), None) => value,
            (Some(&(t0, Some(v0))), Some(&(t1, Some(v1)))) => {
                Some(v0 + (v1 - v0) * (time - t0) / (t1 - t0))
            }
            (Some(&(_, value)), Some(_)) => value,
            (None, None) => None,
        }
    }
}

#[derive(Debug)]
struct PlayerRows {
    rows: Vec<ExtractedBreadcrumb>,
    /// Translate samples dropped because an earlier one rounded to the same
    /// time step.
    merged_samples: usize,
}

/// One row per translate time code whose life resolves to a value, in time
/// order. Time codes are rounded to whole steps; the first sample written for
/// a step wins.
fn player_rows(player: &PlayerPrim) -> Result<PlayerRows, String> {
    let Some(translate) = &player.translate else {
        return Err(format!("missing {TRANSLATE_ATTRIBUTE} time samples"));
    };
    let life = LifeTrack::from_player(player)?;

    let mut ordered = translate.iter().collect::<Vec<_>>();
    ordered.sort_by(|(a, _), (b, _)| a.total_cmp(b));

    let mut rows = Vec::<ExtractedBreadcrumb>::with_capacity(ordered.len());
    let mut merged_samples = 0;
    for (time, value) in ordered {
        let position = match value {
            SampleValue::None => continue,
            SampleValue::Tuple(values) if values.len() == 3 => values,
            _ => {
                return Err(format!(
                    "{TRANSLATE_ATTRIBUTE} sample at {time} is not a 3-tuple"
                ))
            }
        };
        let Some(life) = life.at(*time) else {
            continue;
        };
        let time_step = time.round() as i64;
        if rows.last().is_some_and(|row| row.time_step == time_step) {
            merged_samples += 1;
            continue;
        }
        rows.push(ExtractedBreadcrumb {
            match_id: player.match_id,
            player_id: player.player_id,
            time_step,
            x: position[0],
            y: position[1],
            z: position[2],
            life,
        });
    }
    Ok(PlayerRows {
        rows,
        merged_samples,
    })
}
