// src/python.rs
use numpy::PyArray1;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::action::{ActionKind, PlayerAction};
use crate::errors::EngineError;
use crate::match_state::Match;
use crate::rule::MatchConfig;
use crate::ruleset::RuleKind;
use crate::tiles::{FlowerVariant, Tile};

fn parse_tile(code: Option<&str>, action: ActionKind) -> PyResult<Tile> {
    let code = code.ok_or_else(|| PyValueError::new_err(format!("{} needs a tile", action)))?;
    Ok(code.parse::<Tile>()?)
}

/// Python-facing match driver.
#[pyclass]
pub struct Env {
    inner: Match,
}

#[pymethods]
impl Env {
    #[new]
    #[pyo3(signature = (rule="base", player_count=4, total_rounds=8, base_score=1, score_cap=None, fly_count=0, flower_mode=8, seed=None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        rule: &str,
        player_count: u8,
        total_rounds: u32,
        base_score: u32,
        score_cap: Option<u32>,
        fly_count: u32,
        flower_mode: u8,
        seed: Option<u64>,
    ) -> PyResult<Self> {
        let mut config = match rule.to_ascii_lowercase().as_str() {
            "base" => MatchConfig::default_base(),
            "extended" => MatchConfig::default_extended(),
            other => return Err(PyValueError::new_err(format!("unknown rule '{}'", other))),
        };
        config.player_count = player_count;
        config.total_rounds = total_rounds;
        config.base_score = base_score;
        config.score_cap = score_cap;
        config.fly_count = fly_count;
        config.flower_variant = FlowerVariant::from_code(flower_mode)?;
        config.seed = seed;
        Ok(Self { inner: Match::new(config)? })
    }

    fn start_round(&mut self) -> PyResult<()> {
        self.inner.start_round()?;
        Ok(())
    }

    /// Applies one action. Returns `(round_over, info)`.
    #[pyo3(signature = (seat, action, tile=None, chi_tiles=None))]
    fn step<'py>(
        &mut self,
        py: Python<'py>,
        seat: u8,
        action: &str,
        tile: Option<&str>,
        chi_tiles: Option<(String, String)>,
    ) -> PyResult<(bool, Bound<'py, PyDict>)> {
        let kind: ActionKind = action.parse()?;
        let action = match kind {
            ActionKind::Draw => PlayerAction::Draw,
            ActionKind::Discard => PlayerAction::Discard(parse_tile(tile, kind)?),
            ActionKind::Chi => {
                let (a, b) = chi_tiles.ok_or_else(|| PyValueError::new_err("CHI needs two tiles"))?;
                PlayerAction::Chi([a.parse::<Tile>()?, b.parse::<Tile>()?])
            }
            ActionKind::Pong => PlayerAction::Pong,
            ActionKind::MingKong => PlayerAction::MingKong,
            ActionKind::AnKong => PlayerAction::AnKong(parse_tile(tile, kind)?),
            ActionKind::BuKong => PlayerAction::BuKong(parse_tile(tile, kind)?),
            ActionKind::BuHua => PlayerAction::BuHua,
            ActionKind::Hu => PlayerAction::Hu,
            ActionKind::Pass => PlayerAction::Pass,
        };
        self.inner.apply(seat, action)?;

        let round = self
            .inner
            .round()
            .ok_or_else(|| EngineError::state("round vanished after an action"))?;
        let info = PyDict::new_bound(py);
        info.set_item("status", format!("{:?}", round.status()))?;
        info.set_item("phase", format!("{:?}", round.phase()))?;
        info.set_item("current_seat", round.current_seat())?;
        info.set_item("wall_remaining", round.wall_remaining())?;
        if let Some(winner) = round.outcome().winner {
            info.set_item("winner", winner)?;
            info.set_item("fan", round.outcome().fan_count)?;
            info.set_item("score_changes", round.outcome().score_changes.clone())?;
        }
        Ok((round.is_over(), info))
    }

    fn available_actions(&self, seat: u8) -> Vec<String> {
        self.inner
            .round()
            .map(|r| r.available_actions(seat).iter().map(|a| a.to_string()).collect())
            .unwrap_or_default()
    }

    fn hand(&self, seat: u8) -> PyResult<Vec<String>> {
        let round = self.inner.round().ok_or_else(|| EngineError::action("no round has been started"))?;
        Ok(round.hand(seat)?.iter().map(|t| t.to_string()).collect())
    }

    /// 34-slot count vector of the seat's concealed tiles.
    fn hand_counts<'py>(&self, py: Python<'py>, seat: u8) -> PyResult<Bound<'py, PyArray1<u8>>> {
        let round = self.inner.round().ok_or_else(|| EngineError::action("no round has been started"))?;
        let counts = round.hand_state(seat)?.all_counts();
        Ok(PyArray1::from_slice_bound(py, &counts))
    }

    fn snapshot_json(&self) -> PyResult<String> {
        let round = self.inner.round().ok_or_else(|| EngineError::action("no round has been started"))?;
        Ok(round.snapshot_json()?)
    }

    /// Whole-match state, including the round in play.
    fn match_json(&self) -> PyResult<String> {
        Ok(self.inner.snapshot_json()?)
    }

    #[staticmethod]
    fn resume(json: &str) -> PyResult<Self> {
        Ok(Self { inner: Match::resume_json(json)? })
    }

    fn events_json(&self) -> PyResult<String> {
        let round = self.inner.round().ok_or_else(|| EngineError::action("no round has been started"))?;
        Ok(round.events_json()?)
    }

    fn wild_tile(&self) -> Option<String> {
        self.inner.round().and_then(|r| r.wild_tile()).map(|t| t.to_string())
    }

    fn scores(&self) -> Vec<i64> {
        self.inner.scores().to_vec()
    }

    fn rule(&self) -> &'static str {
        match self.inner.config().rule {
            RuleKind::Base => "base",
            RuleKind::Extended => "extended",
        }
    }

    fn done(&self) -> bool {
        self.inner.is_finished()
    }
}

#[pymodule]
fn shanghai_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Env>()?;
    Ok(())
}
