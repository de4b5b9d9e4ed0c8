use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pp_core::CommunityRole;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{insert_ledger, lock_pair, lock_player, save_player, PgStore};
use crate::entities::*;
use crate::error::{StoreError, StoreResult};
use crate::repos::{CompetitionMutation, FinalizeMutation, PairMutation, SocialRepository};

async fn lock_competition(conn: &mut PgConnection, id: Uuid) -> StoreResult<CompetitionEntity> {
    sqlx::query_as::<_, CompetitionEntity>("SELECT * FROM competitions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| StoreError::not_found("Competition", id))
}

async fn save_competition(conn: &mut PgConnection, row: &CompetitionEntity) -> StoreResult<()> {
    sqlx::query(
        "UPDATE competitions SET prize_pool = $2, winner_id = $3, finalized_at = $4 WHERE id = $1",
    )
    .bind(row.id)
    .bind(row.prize_pool)
    .bind(row.winner_id)
    .bind(row.finalized_at)
    .execute(conn)
    .await?;
    Ok(())
}

#[async_trait]
impl SocialRepository for PgStore {
    async fn create_community(&self, new: NewCommunity) -> StoreResult<CommunityEntity> {
        let community = CommunityEntity::new(new, Utc::now());
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, CommunityEntity>(
            r#"INSERT INTO communities (id, name, description, owner_id, member_count, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *"#,
        )
        .bind(community.id)
        .bind(&community.name)
        .bind(&community.description)
        .bind(community.owner_id)
        .bind(community.member_count)
        .bind(community.created_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO community_members (community_id, player_id, role, joined_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(created.id)
        .bind(created.owner_id)
        .bind(CommunityRole::Owner.as_str())
        .bind(created.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn get_community(&self, id: Uuid) -> StoreResult<Option<CommunityEntity>> {
        let row = sqlx::query_as::<_, CommunityEntity>("SELECT * FROM communities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_communities(&self, limit: i64) -> StoreResult<Vec<CommunityEntity>> {
        let rows = sqlx::query_as::<_, CommunityEntity>(
            "SELECT * FROM communities ORDER BY member_count DESC, created_at LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_member(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<CommunityMemberEntity> {
        let mut tx = self.pool.begin().await?;
        let locked: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM communities WHERE id = $1 FOR UPDATE")
                .bind(community_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(StoreError::not_found("Community", community_id));
        }

        let member = sqlx::query_as::<_, CommunityMemberEntity>(
            r#"INSERT INTO community_members (community_id, player_id, role, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING *"#,
        )
        .bind(community_id)
        .bind(player_id)
        .bind(CommunityRole::Member.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| match StoreError::from(err) {
            StoreError::Conflict(_) => StoreError::conflict("already a member of this community"),
            other => other,
        })?;

        sqlx::query("UPDATE communities SET member_count = member_count + 1 WHERE id = $1")
            .bind(community_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(member)
    }

    async fn remove_member(&self, community_id: Uuid, player_id: Uuid) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        let removed =
            sqlx::query("DELETE FROM community_members WHERE community_id = $1 AND player_id = $2")
                .bind(community_id)
                .bind(player_id)
                .execute(&mut *tx)
                .await?;
        if removed.rows_affected() == 0 {
            return Err(StoreError::not_found(
                "CommunityMember",
                format!("{}/{}", community_id, player_id),
            ));
        }
        sqlx::query(
            "UPDATE communities SET member_count = GREATEST(member_count - 1, 0) WHERE id = $1",
        )
        .bind(community_id)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_member(
        &self,
        community_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<CommunityMemberEntity>> {
        let row = sqlx::query_as::<_, CommunityMemberEntity>(
            "SELECT * FROM community_members WHERE community_id = $1 AND player_id = $2",
        )
        .bind(community_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_members(
        &self,
        community_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CommunityMemberEntity>> {
        let rows = sqlx::query_as::<_, CommunityMemberEntity>(
            "SELECT * FROM community_members WHERE community_id = $1 ORDER BY joined_at LIMIT $2",
        )
        .bind(community_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn post_message(&self, message: ChatMessageEntity) -> StoreResult<ChatMessageEntity> {
        let row = sqlx::query_as::<_, ChatMessageEntity>(
            r#"INSERT INTO chat_messages (id, community_id, player_id, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(message.id)
        .bind(message.community_id)
        .bind(message.player_id)
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_messages(
        &self,
        community_id: Uuid,
        before: Option<DateTime<Utc>>,
        limit: i64,
    ) -> StoreResult<Vec<ChatMessageEntity>> {
        let rows = sqlx::query_as::<_, ChatMessageEntity>(
            r#"SELECT * FROM chat_messages
            WHERE community_id = $1 AND ($2::TIMESTAMPTZ IS NULL OR created_at < $2)
            ORDER BY created_at DESC
            LIMIT $3"#,
        )
        .bind(community_id)
        .bind(before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn create_competition(&self, new: NewCompetition) -> StoreResult<CompetitionEntity> {
        let competition = CompetitionEntity::new(new, Utc::now());
        let row = sqlx::query_as::<_, CompetitionEntity>(
            r#"INSERT INTO competitions
                (id, name, description, creator_id, starts_at, ends_at, entry_fee, prize_pool, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *"#,
        )
        .bind(competition.id)
        .bind(&competition.name)
        .bind(&competition.description)
        .bind(competition.creator_id)
        .bind(competition.starts_at)
        .bind(competition.ends_at)
        .bind(competition.entry_fee)
        .bind(competition.prize_pool)
        .bind(competition.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn get_competition(&self, id: Uuid) -> StoreResult<Option<CompetitionEntity>> {
        let row = sqlx::query_as::<_, CompetitionEntity>("SELECT * FROM competitions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_competitions(&self, limit: i64) -> StoreResult<Vec<CompetitionEntity>> {
        let rows = sqlx::query_as::<_, CompetitionEntity>(
            "SELECT * FROM competitions ORDER BY ends_at LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn join_competition<'a>(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        mutation: CompetitionMutation<'a>,
    ) -> StoreResult<CompetitionEntryEntity> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut competition = lock_competition(&mut tx, competition_id).await?;
        let mut player = lock_player(&mut tx, player_id).await?;

        let entered: Option<(Uuid,)> = sqlx::query_as(
            "SELECT player_id FROM competition_entries WHERE competition_id = $1 AND player_id = $2",
        )
        .bind(competition_id)
        .bind(player_id)
        .fetch_optional(&mut *tx)
        .await?;
        if entered.is_some() {
            return Err(StoreError::conflict("already entered this competition"));
        }

        let entries = mutation(&mut competition, &mut player)?;

        let entry = sqlx::query_as::<_, CompetitionEntryEntity>(
            r#"INSERT INTO competition_entries (competition_id, player_id, score, joined_at, updated_at)
            VALUES ($1, $2, 0, $3, $3)
            RETURNING *"#,
        )
        .bind(competition_id)
        .bind(player_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        save_competition(&mut tx, &competition).await?;
        insert_ledger(&mut tx, entries, now).await?;
        save_player(&mut tx, &player, now).await?;
        tx.commit().await?;
        Ok(entry)
    }

    async fn get_entry(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
    ) -> StoreResult<Option<CompetitionEntryEntity>> {
        let row = sqlx::query_as::<_, CompetitionEntryEntity>(
            "SELECT * FROM competition_entries WHERE competition_id = $1 AND player_id = $2",
        )
        .bind(competition_id)
        .bind(player_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn submit_score(
        &self,
        competition_id: Uuid,
        player_id: Uuid,
        score: i64,
    ) -> StoreResult<CompetitionEntryEntity> {
        sqlx::query_as::<_, CompetitionEntryEntity>(
            r#"UPDATE competition_entries
            SET score = GREATEST(score, $3), updated_at = $4
            WHERE competition_id = $1 AND player_id = $2
            RETURNING *"#,
        )
        .bind(competition_id)
        .bind(player_id)
        .bind(score)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            StoreError::not_found("CompetitionEntry", format!("{}/{}", competition_id, player_id))
        })
    }

    async fn standings(
        &self,
        competition_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<CompetitionEntryEntity>> {
        let rows = sqlx::query_as::<_, CompetitionEntryEntity>(
            r#"SELECT * FROM competition_entries
            WHERE competition_id = $1
            ORDER BY score DESC, joined_at ASC
            LIMIT $2"#,
        )
        .bind(competition_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn finalize_competition<'a>(
        &self,
        competition_id: Uuid,
        mutation: FinalizeMutation<'a>,
    ) -> StoreResult<CompetitionEntity> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut competition = lock_competition(&mut tx, competition_id).await?;

        let leader: Option<(Uuid,)> = sqlx::query_as(
            r#"SELECT player_id FROM competition_entries
            WHERE competition_id = $1
            ORDER BY score DESC, joined_at ASC
            LIMIT 1"#,
        )
        .bind(competition_id)
        .fetch_optional(&mut *tx)
        .await?;
        let mut winner = match leader {
            Some((player_id,)) => Some(lock_player(&mut tx, player_id).await?),
            None => None,
        };

        let entries = mutation(&mut competition, winner.as_mut())?;

        save_competition(&mut tx, &competition).await?;
        insert_ledger(&mut tx, entries, now).await?;
        if let Some(player) = &winner {
            save_player(&mut tx, player, now).await?;
        }
        tx.commit().await?;
        Ok(competition)
    }

    async fn apply_referral<'a>(
        &self,
        referral: NewReferral,
        mutation: PairMutation<'a>,
    ) -> StoreResult<ReferralEntity> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let (mut referrer, mut referee) =
            lock_pair(&mut tx, referral.referrer_id, referral.referee_id).await?;

        let existing: Option<(Uuid,)> =
            sqlx::query_as("SELECT referee_id FROM referrals WHERE referee_id = $1")
                .bind(referral.referee_id)
                .fetch_optional(&mut *tx)
                .await?;
        if existing.is_some() {
            return Err(StoreError::conflict("a referral code was already applied"));
        }

        let entries = mutation(&mut referrer, &mut referee)?;

        let row = sqlx::query_as::<_, ReferralEntity>(
            r#"INSERT INTO referrals (referee_id, referrer_id, referrer_reward, referee_reward, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *"#,
        )
        .bind(referral.referee_id)
        .bind(referral.referrer_id)
        .bind(referral.referrer_reward)
        .bind(referral.referee_reward)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;
        insert_ledger(&mut tx, entries, now).await?;
        save_player(&mut tx, &referrer, now).await?;
        save_player(&mut tx, &referee, now).await?;
        tx.commit().await?;
        Ok(row)
    }

    async fn list_referrals(&self, referrer_id: Uuid) -> StoreResult<Vec<ReferralEntity>> {
        let rows = sqlx::query_as::<_, ReferralEntity>(
            "SELECT * FROM referrals WHERE referrer_id = $1 ORDER BY created_at DESC",
        )
        .bind(referrer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_referrals(&self, referrer_id: Uuid) -> StoreResult<i64> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM referrals WHERE referrer_id = $1")
                .bind(referrer_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
