//! PostgreSQL implementation of [`TournamentStore`].
//!
//! All queries run through the timeout helpers so a stalled database
//! surfaces as [`StoreError::Timeout`](crate::store::StoreError)
//! instead of hanging a heat mid-competition.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::heat::models::{
    Heat, HeatId, HeatSegment, HeatStatus, NewHeat, NewHeatSegment, SegmentCode, SegmentStatus,
};
use crate::schedule::models::{RoundTimePlan, Station, StationId, StationStatus};
use crate::scoring::models::{
    Beverage, CupPosition, CupSide, HeatScore, JudgeBallot, JudgeRole, NewJudgeBallot,
};
use crate::store::repository::{StoreError, StoreResult, TournamentStore};
use crate::store::timeouts::{with_default_timeout, with_transaction_timeout};
use crate::tournament::models::{
    Participant, ParticipantId, Tournament, TournamentId, TournamentStatus,
};

/// Default PostgreSQL implementation of [`TournamentStore`]
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a store over an existing connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn unknown(column: &'static str, value: &str) -> StoreError {
    StoreError::UnknownValue {
        column,
        value: value.to_string(),
    }
}

fn tournament_status_to_str(status: TournamentStatus) -> &'static str {
    match status {
        TournamentStatus::Registration => "REGISTRATION",
        TournamentStatus::InProgress => "IN_PROGRESS",
        TournamentStatus::Completed => "COMPLETED",
        TournamentStatus::Cancelled => "CANCELLED",
    }
}

fn tournament_status_from_str(s: &str) -> StoreResult<TournamentStatus> {
    match s {
        "REGISTRATION" => Ok(TournamentStatus::Registration),
        "IN_PROGRESS" => Ok(TournamentStatus::InProgress),
        "COMPLETED" => Ok(TournamentStatus::Completed),
        "CANCELLED" => Ok(TournamentStatus::Cancelled),
        other => Err(unknown("tournament status", other)),
    }
}

fn heat_status_to_str(status: HeatStatus) -> &'static str {
    match status {
        HeatStatus::Pending => "PENDING",
        HeatStatus::Ready => "READY",
        HeatStatus::Running => "RUNNING",
        HeatStatus::Done => "DONE",
    }
}

fn heat_status_from_str(s: &str) -> StoreResult<HeatStatus> {
    match s {
        "PENDING" => Ok(HeatStatus::Pending),
        "READY" => Ok(HeatStatus::Ready),
        "RUNNING" => Ok(HeatStatus::Running),
        "DONE" => Ok(HeatStatus::Done),
        other => Err(unknown("heat status", other)),
    }
}

fn segment_status_to_str(status: SegmentStatus) -> &'static str {
    match status {
        SegmentStatus::Idle => "IDLE",
        SegmentStatus::Running => "RUNNING",
        SegmentStatus::Ended => "ENDED",
    }
}

fn segment_status_from_str(s: &str) -> StoreResult<SegmentStatus> {
    match s {
        "IDLE" => Ok(SegmentStatus::Idle),
        "RUNNING" => Ok(SegmentStatus::Running),
        "ENDED" => Ok(SegmentStatus::Ended),
        other => Err(unknown("segment status", other)),
    }
}

fn segment_code_from_str(s: &str) -> StoreResult<SegmentCode> {
    match s {
        "DIAL_IN" => Ok(SegmentCode::DialIn),
        "CAPPUCCINO" => Ok(SegmentCode::Cappuccino),
        "ESPRESSO" => Ok(SegmentCode::Espresso),
        other => Err(unknown("segment code", other)),
    }
}

fn station_status_to_str(status: StationStatus) -> &'static str {
    match status {
        StationStatus::Available => "AVAILABLE",
        StationStatus::Busy => "BUSY",
        StationStatus::Offline => "OFFLINE",
    }
}

fn station_status_from_str(s: &str) -> StoreResult<StationStatus> {
    match s {
        "AVAILABLE" => Ok(StationStatus::Available),
        "BUSY" => Ok(StationStatus::Busy),
        "OFFLINE" => Ok(StationStatus::Offline),
        other => Err(unknown("station status", other)),
    }
}

fn cup_side_to_str(side: CupSide) -> &'static str {
    match side {
        CupSide::Left => "LEFT",
        CupSide::Right => "RIGHT",
    }
}

fn cup_side_from_str(s: &str) -> StoreResult<CupSide> {
    match s {
        "LEFT" => Ok(CupSide::Left),
        "RIGHT" => Ok(CupSide::Right),
        other => Err(unknown("cup side", other)),
    }
}

fn beverage_to_str(beverage: Beverage) -> &'static str {
    match beverage {
        Beverage::Cappuccino => "CAPPUCCINO",
        Beverage::Espresso => "ESPRESSO",
    }
}

fn beverage_from_str(s: &str) -> StoreResult<Beverage> {
    match s {
        "CAPPUCCINO" => Ok(Beverage::Cappuccino),
        "ESPRESSO" => Ok(Beverage::Espresso),
        other => Err(unknown("beverage", other)),
    }
}

fn judge_role_to_str(role: JudgeRole) -> &'static str {
    match role {
        JudgeRole::Sensory => "SENSORY",
        JudgeRole::Cappuccino => "CAPPUCCINO",
        JudgeRole::Espresso => "ESPRESSO",
    }
}

fn judge_role_from_str(s: &str) -> StoreResult<JudgeRole> {
    match s {
        "SENSORY" => Ok(JudgeRole::Sensory),
        "CAPPUCCINO" => Ok(JudgeRole::Cappuccino),
        "ESPRESSO" => Ok(JudgeRole::Espresso),
        other => Err(unknown("judge role", other)),
    }
}

fn opt_side(row: &PgRow, column: &str) -> StoreResult<Option<CupSide>> {
    row.get::<Option<String>, _>(column)
        .as_deref()
        .map(cup_side_from_str)
        .transpose()
}

fn opt_utc(row: &PgRow, column: &str) -> Option<DateTime<Utc>> {
    row.get::<Option<NaiveDateTime>, _>(column).map(|t| t.and_utc())
}

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let config_json: String = row.get("config");
    Ok(Tournament {
        id: row.get("id"),
        name: row.get("name"),
        status: tournament_status_from_str(row.get::<String, _>("status").as_str())?,
        config: serde_json::from_str(&config_json)?,
        current_round: row.get::<i32, _>("current_round") as u32,
        total_rounds: row.get::<i32, _>("total_rounds") as u32,
        winner_id: row.get("winner_id"),
        created_at: row.get::<NaiveDateTime, _>("created_at").and_utc(),
        started_at: opt_utc(row, "started_at"),
        finished_at: opt_utc(row, "finished_at"),
    })
}

fn participant_from_row(row: &PgRow) -> Participant {
    Participant {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        display_name: row.get("display_name"),
        seed: row.get::<i32, _>("seed") as u32,
        cumulative_score: row.get("cumulative_score"),
        eliminated_round: row.get::<Option<i32>, _>("eliminated_round").map(|r| r as u32),
        final_rank: row.get::<Option<i32>, _>("final_rank").map(|r| r as u32),
    }
}

fn station_from_row(row: &PgRow) -> StoreResult<Station> {
    Ok(Station {
        id: row.get("id"),
        name: row.get("name"),
        status: station_status_from_str(row.get::<String, _>("status").as_str())?,
        next_available_at: row.get::<NaiveDateTime, _>("next_available_at").and_utc(),
        lead_id: row.get::<Option<Uuid>, _>("lead_id"),
    })
}

fn heat_from_row(row: &PgRow) -> StoreResult<Heat> {
    Ok(Heat {
        id: row.get("id"),
        tournament_id: row.get("tournament_id"),
        round: row.get::<i32, _>("round") as u32,
        heat_number: row.get::<i32, _>("heat_number") as u32,
        station_id: row.get("station_id"),
        competitor1_id: row.get("competitor1_id"),
        competitor2_id: row.get("competitor2_id"),
        status: heat_status_from_str(row.get::<String, _>("status").as_str())?,
        winner_id: row.get("winner_id"),
        scheduled_at: opt_utc(row, "scheduled_at"),
        started_at: opt_utc(row, "started_at"),
        ended_at: opt_utc(row, "ended_at"),
    })
}

fn segment_from_row(row: &PgRow) -> StoreResult<HeatSegment> {
    Ok(HeatSegment {
        id: row.get("id"),
        heat_id: row.get("heat_id"),
        code: segment_code_from_str(row.get::<String, _>("code").as_str())?,
        status: segment_status_from_str(row.get::<String, _>("status").as_str())?,
        planned_minutes: row.get::<i32, _>("planned_minutes") as u32,
        started_at: opt_utc(row, "started_at"),
        ended_at: opt_utc(row, "ended_at"),
    })
}

fn ballot_from_row(row: &PgRow) -> StoreResult<JudgeBallot> {
    Ok(JudgeBallot {
        id: row.get("id"),
        heat_id: row.get("heat_id"),
        judge_id: row.get("judge_id"),
        judge_role: judge_role_from_str(row.get::<String, _>("judge_role").as_str())?,
        beverage: beverage_from_str(row.get::<String, _>("beverage").as_str())?,
        left_cup_code: row.get("left_cup_code"),
        right_cup_code: row.get("right_cup_code"),
        visual_latte_art: opt_side(row, "visual_latte_art")?,
        taste: opt_side(row, "taste")?,
        tactile: opt_side(row, "tactile")?,
        flavour: opt_side(row, "flavour")?,
        overall: opt_side(row, "overall")?,
        submitted_at: row.get::<NaiveDateTime, _>("submitted_at").and_utc(),
    })
}

fn cup_position_from_row(row: &PgRow) -> StoreResult<CupPosition> {
    Ok(CupPosition {
        heat_id: row.get("heat_id"),
        participant_id: row.get("participant_id"),
        cup_code: row.get("cup_code"),
        side: cup_side_from_str(row.get::<String, _>("side").as_str())?,
    })
}

fn heat_score_from_row(row: &PgRow) -> HeatScore {
    HeatScore {
        heat_id: row.get("heat_id"),
        participant_id: row.get("participant_id"),
        total: row.get::<i32, _>("total") as u32,
    }
}

fn round_plan_from_row(row: &PgRow) -> RoundTimePlan {
    RoundTimePlan {
        tournament_id: row.get("tournament_id"),
        round: row.get::<i32, _>("round") as u32,
        dial_in_minutes: row.get::<i32, _>("dial_in_minutes") as u32,
        cappuccino_minutes: row.get::<i32, _>("cappuccino_minutes") as u32,
        espresso_minutes: row.get::<i32, _>("espresso_minutes") as u32,
    }
}

#[async_trait]
impl TournamentStore for PgStore {
    async fn get_tournament(&self, id: TournamentId) -> StoreResult<Option<Tournament>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, name, status, config, current_round, total_rounds, winner_id,
                        created_at, started_at, finished_at
                 FROM tournaments WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.map(|r| tournament_from_row(&r)).transpose()
    }

    async fn set_tournament_status(
        &self,
        id: TournamentId,
        status: TournamentStatus,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE tournaments
                 SET status = $2,
                     started_at = CASE
                         WHEN $2 = 'IN_PROGRESS' AND started_at IS NULL THEN NOW()
                         ELSE started_at
                     END,
                     finished_at = CASE
                         WHEN $2 IN ('COMPLETED', 'CANCELLED') THEN NOW()
                         ELSE finished_at
                     END
                 WHERE id = $1",
            )
            .bind(id)
            .bind(tournament_status_to_str(status))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_tournament_rounds(
        &self,
        id: TournamentId,
        current_round: u32,
        total_rounds: u32,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE tournaments SET current_round = $2, total_rounds = $3 WHERE id = $1")
                .bind(id)
                .bind(current_round as i32)
                .bind(total_rounds as i32)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_tournament_current_round(&self, id: TournamentId, round: u32) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE tournaments SET current_round = $2 WHERE id = $1")
                .bind(id)
                .bind(round as i32)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_tournament_winner(
        &self,
        id: TournamentId,
        winner_id: ParticipantId,
    ) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE tournaments SET winner_id = $2 WHERE id = $1")
                .bind(id)
                .bind(winner_id)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_participants(&self, tournament_id: TournamentId) -> StoreResult<Vec<Participant>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, display_name, seed, cumulative_score,
                        eliminated_round, final_rank
                 FROM participants WHERE tournament_id = $1 ORDER BY seed",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(participant_from_row).collect())
    }

    async fn add_to_participant_score(&self, id: ParticipantId, delta: i64) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE participants SET cumulative_score = cumulative_score + $2 WHERE id = $1",
            )
            .bind(id)
            .bind(delta)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_participant_elimination(&self, id: ParticipantId, round: u32) -> StoreResult<()> {
        // Sticky: the first recorded elimination round wins.
        with_default_timeout(
            sqlx::query(
                "UPDATE participants SET eliminated_round = $2
                 WHERE id = $1 AND eliminated_round IS NULL",
            )
            .bind(id)
            .bind(round as i32)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_participant_final_rank(&self, id: ParticipantId, rank: u32) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query("UPDATE participants SET final_rank = $2 WHERE id = $1")
                .bind(id)
                .bind(rank as i32)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_stations(&self) -> StoreResult<Vec<Station>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, name, status, next_available_at, lead_id
                 FROM stations ORDER BY name",
            )
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(station_from_row).collect()
    }

    async fn get_station(&self, id: StationId) -> StoreResult<Option<Station>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, name, status, next_available_at, lead_id
                 FROM stations WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(station_from_row).transpose()
    }

    async fn update_station(&self, station: &Station) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE stations SET status = $2, next_available_at = $3, lead_id = $4
                 WHERE id = $1",
            )
            .bind(station.id)
            .bind(station_status_to_str(station.status))
            .bind(station.next_available_at.naive_utc())
            .bind(station.lead_id)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn create_heat(&self, heat: &NewHeat) -> StoreResult<Heat> {
        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO heats (tournament_id, round, heat_number, station_id,
                                    competitor1_id, competitor2_id, status, winner_id,
                                    scheduled_at, started_at, ended_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                 RETURNING id",
            )
            .bind(heat.tournament_id)
            .bind(heat.round as i32)
            .bind(heat.heat_number as i32)
            .bind(heat.station_id)
            .bind(heat.competitor1_id)
            .bind(heat.competitor2_id)
            .bind(heat_status_to_str(heat.status))
            .bind(heat.winner_id)
            .bind(heat.scheduled_at.map(|t| t.naive_utc()))
            .bind(heat.started_at.map(|t| t.naive_utc()))
            .bind(heat.ended_at.map(|t| t.naive_utc()))
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(Heat {
            id: row.get("id"),
            tournament_id: heat.tournament_id,
            round: heat.round,
            heat_number: heat.heat_number,
            station_id: heat.station_id,
            competitor1_id: heat.competitor1_id,
            competitor2_id: heat.competitor2_id,
            status: heat.status,
            winner_id: heat.winner_id,
            scheduled_at: heat.scheduled_at,
            started_at: heat.started_at,
            ended_at: heat.ended_at,
        })
    }

    async fn get_heat(&self, id: HeatId) -> StoreResult<Option<Heat>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, round, heat_number, station_id, competitor1_id,
                        competitor2_id, status, winner_id, scheduled_at, started_at, ended_at
                 FROM heats WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await?;

        row.as_ref().map(heat_from_row).transpose()
    }

    async fn update_heat(&self, heat: &Heat) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE heats SET station_id = $2, status = $3, winner_id = $4,
                        scheduled_at = $5, started_at = $6, ended_at = $7
                 WHERE id = $1",
            )
            .bind(heat.id)
            .bind(heat.station_id)
            .bind(heat_status_to_str(heat.status))
            .bind(heat.winner_id)
            .bind(heat.scheduled_at.map(|t| t.naive_utc()))
            .bind(heat.started_at.map(|t| t.naive_utc()))
            .bind(heat.ended_at.map(|t| t.naive_utc()))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_heats(&self, tournament_id: TournamentId) -> StoreResult<Vec<Heat>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, round, heat_number, station_id, competitor1_id,
                        competitor2_id, status, winner_id, scheduled_at, started_at, ended_at
                 FROM heats WHERE tournament_id = $1 ORDER BY heat_number",
            )
            .bind(tournament_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(heat_from_row).collect()
    }

    async fn list_round_heats(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Vec<Heat>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, tournament_id, round, heat_number, station_id, competitor1_id,
                        competitor2_id, status, winner_id, scheduled_at, started_at, ended_at
                 FROM heats WHERE tournament_id = $1 AND round = $2 ORDER BY heat_number",
            )
            .bind(tournament_id)
            .bind(round as i32)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(heat_from_row).collect()
    }

    async fn complete_heat(
        &self,
        id: HeatId,
        winner_id: ParticipantId,
        ended_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        // Compare-and-set so two finalizers cannot both decide a heat.
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE heats SET status = 'DONE', winner_id = $2, ended_at = $3
                 WHERE id = $1 AND status <> 'DONE'",
            )
            .bind(id)
            .bind(winner_id)
            .bind(ended_at.naive_utc())
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_segment(&self, segment: &NewHeatSegment) -> StoreResult<HeatSegment> {
        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO heat_segments (heat_id, code, status, planned_minutes)
                 VALUES ($1, $2, 'IDLE', $3)
                 RETURNING id",
            )
            .bind(segment.heat_id)
            .bind(segment.code.as_str())
            .bind(segment.planned_minutes as i32)
            .fetch_one(&self.pool),
        )
        .await?;

        Ok(HeatSegment {
            id: row.get("id"),
            heat_id: segment.heat_id,
            code: segment.code,
            status: SegmentStatus::Idle,
            planned_minutes: segment.planned_minutes,
            started_at: None,
            ended_at: None,
        })
    }

    async fn update_segment(&self, segment: &HeatSegment) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "UPDATE heat_segments SET status = $2, started_at = $3, ended_at = $4
                 WHERE id = $1",
            )
            .bind(segment.id)
            .bind(segment_status_to_str(segment.status))
            .bind(segment.started_at.map(|t| t.naive_utc()))
            .bind(segment.ended_at.map(|t| t.naive_utc()))
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn list_segments(&self, heat_id: HeatId) -> StoreResult<Vec<HeatSegment>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, heat_id, code, status, planned_minutes, started_at, ended_at
                 FROM heat_segments WHERE heat_id = $1
                 ORDER BY CASE code
                     WHEN 'DIAL_IN' THEN 0
                     WHEN 'CAPPUCCINO' THEN 1
                     ELSE 2
                 END",
            )
            .bind(heat_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(segment_from_row).collect()
    }

    async fn upsert_ballot(&self, ballot: &NewJudgeBallot) -> StoreResult<JudgeBallot> {
        let row = with_default_timeout(
            sqlx::query(
                "INSERT INTO judge_ballots (heat_id, judge_id, judge_role, beverage,
                                            left_cup_code, right_cup_code, visual_latte_art,
                                            taste, tactile, flavour, overall, submitted_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW())
                 ON CONFLICT (heat_id, judge_id) DO UPDATE SET
                     judge_role = EXCLUDED.judge_role,
                     beverage = EXCLUDED.beverage,
                     left_cup_code = EXCLUDED.left_cup_code,
                     right_cup_code = EXCLUDED.right_cup_code,
                     visual_latte_art = EXCLUDED.visual_latte_art,
                     taste = EXCLUDED.taste,
                     tactile = EXCLUDED.tactile,
                     flavour = EXCLUDED.flavour,
                     overall = EXCLUDED.overall,
                     submitted_at = NOW()
                 RETURNING id, heat_id, judge_id, judge_role, beverage, left_cup_code,
                           right_cup_code, visual_latte_art, taste, tactile, flavour,
                           overall, submitted_at",
            )
            .bind(ballot.heat_id)
            .bind(ballot.judge_id)
            .bind(judge_role_to_str(ballot.judge_role))
            .bind(beverage_to_str(ballot.beverage))
            .bind(&ballot.left_cup_code)
            .bind(&ballot.right_cup_code)
            .bind(ballot.visual_latte_art.map(cup_side_to_str))
            .bind(ballot.taste.map(cup_side_to_str))
            .bind(ballot.tactile.map(cup_side_to_str))
            .bind(ballot.flavour.map(cup_side_to_str))
            .bind(ballot.overall.map(cup_side_to_str))
            .fetch_one(&self.pool),
        )
        .await?;

        ballot_from_row(&row)
    }

    async fn list_ballots(&self, heat_id: HeatId) -> StoreResult<Vec<JudgeBallot>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT id, heat_id, judge_id, judge_role, beverage, left_cup_code,
                        right_cup_code, visual_latte_art, taste, tactile, flavour,
                        overall, submitted_at
                 FROM judge_ballots WHERE heat_id = $1 ORDER BY submitted_at, id",
            )
            .bind(heat_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(ballot_from_row).collect()
    }

    async fn replace_cup_positions(
        &self,
        heat_id: HeatId,
        positions: &[CupPosition],
    ) -> StoreResult<()> {
        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM cup_positions WHERE heat_id = $1")
                .bind(heat_id)
                .execute(&mut *tx)
                .await?;
            for position in positions {
                sqlx::query(
                    "INSERT INTO cup_positions (heat_id, participant_id, cup_code, side)
                     VALUES ($1, $2, $3, $4)",
                )
                .bind(position.heat_id)
                .bind(position.participant_id)
                .bind(&position.cup_code)
                .bind(cup_side_to_str(position.side))
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
            Ok::<_, sqlx::Error>(())
        })
        .await
    }

    async fn list_cup_positions(&self, heat_id: HeatId) -> StoreResult<Vec<CupPosition>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT heat_id, participant_id, cup_code, side
                 FROM cup_positions WHERE heat_id = $1 ORDER BY side",
            )
            .bind(heat_id)
            .fetch_all(&self.pool),
        )
        .await?;

        rows.iter().map(cup_position_from_row).collect()
    }

    async fn replace_heat_scores(&self, heat_id: HeatId, scores: &[HeatScore]) -> StoreResult<()> {
        with_transaction_timeout(async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM heat_scores WHERE heat_id = $1")
                .bind(heat_id)
                .execute(&mut *tx)
                .await?;
            for score in scores {
                sqlx::query(
                    "INSERT INTO heat_scores (heat_id, participant_id, total)
                     VALUES ($1, $2, $3)",
                )
                .bind(score.heat_id)
                .bind(score.participant_id)
                .bind(score.total as i32)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
            Ok::<_, sqlx::Error>(())
        })
        .await
    }

    async fn list_heat_scores(&self, heat_id: HeatId) -> StoreResult<Vec<HeatScore>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT heat_id, participant_id, total
                 FROM heat_scores WHERE heat_id = $1 ORDER BY participant_id",
            )
            .bind(heat_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(heat_score_from_row).collect())
    }

    async fn get_round_plan(
        &self,
        tournament_id: TournamentId,
        round: u32,
    ) -> StoreResult<Option<RoundTimePlan>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT tournament_id, round, dial_in_minutes, cappuccino_minutes, espresso_minutes
                 FROM round_time_plans WHERE tournament_id = $1 AND round = $2",
            )
            .bind(tournament_id)
            .bind(round as i32)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(round_plan_from_row))
    }

    async fn insert_round_plan(&self, plan: &RoundTimePlan) -> StoreResult<()> {
        with_default_timeout(
            sqlx::query(
                "INSERT INTO round_time_plans (tournament_id, round, dial_in_minutes,
                                               cappuccino_minutes, espresso_minutes)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (tournament_id, round) DO UPDATE SET
                     dial_in_minutes = EXCLUDED.dial_in_minutes,
                     cappuccino_minutes = EXCLUDED.cappuccino_minutes,
                     espresso_minutes = EXCLUDED.espresso_minutes",
            )
            .bind(plan.tournament_id)
            .bind(plan.round as i32)
            .bind(plan.dial_in_minutes as i32)
            .bind(plan.cappuccino_minutes as i32)
            .bind(plan.espresso_minutes as i32)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
