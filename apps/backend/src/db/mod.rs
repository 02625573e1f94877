//! PostgreSQL database operations

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use exercise_core::{
    assemble_compound, next_order_index, swap_steps, CompositionError, CompositionGraph,
    MissingChildPolicy,
};

use crate::error::{ApiError, Result};
use crate::models::*;

/// Database wrapper with connection pool
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

/// Exercise row joined with its optional simple detail
#[derive(sqlx::FromRow)]
struct ExerciseDetailRow {
    id: Uuid,
    name: String,
    #[sqlx(rename = "type")]
    exercise_type: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    detail_exercise_id: Option<Uuid>,
    duration: Option<i32>,
    repetitions: Option<i32>,
    movement: Option<String>,
    notes: Option<String>,
}

impl ExerciseDetailRow {
    fn into_model(self) -> ExerciseWithDetail {
        let detail = self.detail_exercise_id.map(|_| SimpleExerciseDetail {
            duration: self.duration,
            repetitions: self.repetitions,
            movement: self.movement.clone(),
            notes: self.notes.clone(),
        });
        let db = DbExercise {
            id: self.id,
            name: self.name,
            exercise_type: self.exercise_type,
            description: self.description,
            created_at: self.created_at,
        };
        ExerciseWithDetail {
            exercise: db.to_exercise(),
            detail,
        }
    }
}

const EXERCISE_WITH_DETAIL_COLUMNS: &str = r#"
    e.id, e.name, e.type, e.description, e.created_at,
    s.exercise_id as detail_exercise_id,
    s.duration, s.repetitions, s.movement, s.notes
"#;

impl Database {
    /// Connect to PostgreSQL and create connection pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| ApiError::Migration(e.to_string()))?;
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // === User Repository ===

    /// Create a new user with a generated bearer token
    pub async fn create_user(&self, email: &str, password_hash: &str) -> Result<User> {
        let token = Uuid::new_v4().to_string();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, token)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, token, is_admin, is_active,
                      created_at, updated_at, last_seen_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(&token)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get an active user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, token, is_admin, is_active,
                   created_at, updated_at, last_seen_at
            FROM users
            WHERE email = $1 AND is_active
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Get an active user by bearer token
    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, token, is_admin, is_active,
                   created_at, updated_at, last_seen_at
            FROM users
            WHERE token = $1 AND is_active
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Update user last_seen_at timestamp
    pub async fn update_last_seen(&self, user_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace a user's password hash
    pub async fn update_password(&self, user_id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deactivate a user account
    pub async fn deactivate_user(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND is_active
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Admin Repository ===

    /// All user accounts, newest first, active or not
    pub async fn get_all_users(&self) -> Result<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, token, is_admin, is_active,
                   created_at, updated_at, last_seen_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Update another account's admin/active flags
    pub async fn admin_update_user(
        &self,
        user_id: Uuid,
        request: &AdminUpdateUserRequest,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_admin = COALESCE($2, is_admin),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, password_hash, token, is_admin, is_active,
                      created_at, updated_at, last_seen_at
            "#,
        )
        .bind(user_id)
        .bind(request.is_admin)
        .bind(request.is_active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Delete a user account outright. Idempotent like the other deletes.
    pub async fn delete_user(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // === Exercise Repository ===

    /// Create an exercise; simple detail (when given) is written in the
    /// same transaction.
    pub async fn create_exercise(&self, request: &CreateExerciseRequest) -> Result<ExerciseWithDetail> {
        let mut tx = self.pool.begin().await?;

        let exercise = sqlx::query_as::<_, DbExercise>(
            r#"
            INSERT INTO exercise (name, type, description)
            VALUES ($1, $2, $3)
            RETURNING id, name, type, description, created_at
            "#,
        )
        .bind(&request.name)
        .bind(request.exercise_type.as_str())
        .bind(&request.description)
        .fetch_one(&mut *tx)
        .await?;

        let mut detail = None;
        if request.exercise_type == ExerciseType::Simple {
            if let Some(d) = &request.detail {
                sqlx::query(
                    r#"
                    INSERT INTO simple_exercise (exercise_id, duration, repetitions, movement, notes)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(exercise.id)
                .bind(d.duration)
                .bind(d.repetitions)
                .bind(&d.movement)
                .bind(&d.notes)
                .execute(&mut *tx)
                .await?;
                detail = Some(d.clone());
            }
        }

        tx.commit().await?;

        Ok(ExerciseWithDetail {
            exercise: exercise.to_exercise(),
            detail,
        })
    }

    /// Get exercise by ID
    pub async fn get_exercise(&self, id: Uuid) -> Result<Option<DbExercise>> {
        let exercise = sqlx::query_as::<_, DbExercise>(
            r#"
            SELECT id, name, type, description, created_at
            FROM exercise
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exercise)
    }

    /// Get an exercise with its simple detail attached
    pub async fn get_exercise_with_detail(&self, id: Uuid) -> Result<Option<ExerciseWithDetail>> {
        let row = sqlx::query_as::<_, ExerciseDetailRow>(&format!(
            r#"
            SELECT {EXERCISE_WITH_DETAIL_COLUMNS}
            FROM exercise e
            LEFT JOIN simple_exercise s ON s.exercise_id = e.id
            WHERE e.id = $1
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(ExerciseDetailRow::into_model))
    }

    /// Get all exercises, newest first, with simple details attached
    pub async fn get_all_exercises(&self) -> Result<Vec<ExerciseWithDetail>> {
        let rows = sqlx::query_as::<_, ExerciseDetailRow>(&format!(
            r#"
            SELECT {EXERCISE_WITH_DETAIL_COLUMNS}
            FROM exercise e
            LEFT JOIN simple_exercise s ON s.exercise_id = e.id
            ORDER BY e.created_at DESC
            "#
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExerciseDetailRow::into_model).collect())
    }

    /// Search exercises by name, case-insensitive substring match
    pub async fn search_exercises(&self, query: &str) -> Result<Vec<ExerciseWithDetail>> {
        let pattern = format!("%{}%", query);
        let rows = sqlx::query_as::<_, ExerciseDetailRow>(&format!(
            r#"
            SELECT {EXERCISE_WITH_DETAIL_COLUMNS}
            FROM exercise e
            LEFT JOIN simple_exercise s ON s.exercise_id = e.id
            WHERE e.name ILIKE $1
            ORDER BY e.name
            "#
        ))
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExerciseDetailRow::into_model).collect())
    }

    /// All exercises except the given one, as candidate components.
    /// The authoritative self-reference guard lives in `add_component`.
    pub async fn list_assignable_exercises(&self, excluding: Uuid) -> Result<Vec<ExerciseWithDetail>> {
        let rows = sqlx::query_as::<_, ExerciseDetailRow>(&format!(
            r#"
            SELECT {EXERCISE_WITH_DETAIL_COLUMNS}
            FROM exercise e
            LEFT JOIN simple_exercise s ON s.exercise_id = e.id
            WHERE e.id <> $1
            ORDER BY e.name
            "#
        ))
        .bind(excluding)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ExerciseDetailRow::into_model).collect())
    }

    /// Update an exercise's name/description and upsert its simple detail.
    /// The type column is never touched here; type changes are rejected at
    /// the route layer.
    pub async fn update_exercise(
        &self,
        id: Uuid,
        request: &UpdateExerciseRequest,
    ) -> Result<Option<ExerciseWithDetail>> {
        let mut tx = self.pool.begin().await?;

        let exercise = sqlx::query_as::<_, DbExercise>(
            r#"
            UPDATE exercise
            SET name = COALESCE($2, name),
                description = COALESCE($3, description)
            WHERE id = $1
            RETURNING id, name, type, description, created_at
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(exercise) = exercise else {
            return Ok(None);
        };

        if exercise.exercise_type == "simple" {
            if let Some(d) = &request.detail {
                sqlx::query(
                    r#"
                    INSERT INTO simple_exercise (exercise_id, duration, repetitions, movement, notes)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (exercise_id) DO UPDATE SET
                        duration = EXCLUDED.duration,
                        repetitions = EXCLUDED.repetitions,
                        movement = EXCLUDED.movement,
                        notes = EXCLUDED.notes
                    "#,
                )
                .bind(id)
                .bind(d.duration)
                .bind(d.repetitions)
                .bind(&d.movement)
                .bind(&d.notes)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        self.get_exercise_with_detail(id).await
    }

    /// Delete an exercise. Its own component rows cascade (it is the
    /// parent); edges where it is the child are left dangling.
    pub async fn delete_exercise(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM exercise
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Batch-fetch exercises by ID
    pub async fn get_exercises_by_ids(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Exercise>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, DbExercise>(
            r#"
            SELECT id, name, type, description, created_at
            FROM exercise
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|e| (e.id, e.to_exercise())).collect())
    }

    // === Component Repository ===

    /// Get a component row by ID
    pub async fn get_component(&self, id: Uuid) -> Result<Option<DbComponent>> {
        let component = sqlx::query_as::<_, DbComponent>(
            r#"
            SELECT id, parent_exercise_id, child_exercise_id, quantity, order_index
            FROM compound_exercise_component
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(component)
    }

    /// Components of a parent, ordered by position
    pub async fn get_components_by_parent(&self, parent_id: Uuid) -> Result<Vec<DbComponent>> {
        let components = sqlx::query_as::<_, DbComponent>(
            r#"
            SELECT id, parent_exercise_id, child_exercise_id, quantity, order_index
            FROM compound_exercise_component
            WHERE parent_exercise_id = $1
            ORDER BY order_index
            "#,
        )
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(components)
    }

    /// Add a component to a compound exercise.
    ///
    /// Runs as one transaction: the parent row is locked to serialize
    /// order-index allocation per parent, all edges are bulk-fetched once
    /// and the new edge is cycle-checked in memory before the insert.
    pub async fn add_component(
        &self,
        parent_id: Uuid,
        request: &AddComponentRequest,
    ) -> Result<DbComponent> {
        let child_id = request.child_exercise_id;

        if request.quantity < 1 {
            return Err(CompositionError::InvalidQuantity(request.quantity).into());
        }
        if let Some(order_index) = request.order_index {
            if order_index < 1 {
                return Err(CompositionError::InvalidOrderIndex(order_index).into());
            }
        }
        if parent_id == child_id {
            return Err(CompositionError::SelfReference(parent_id).into());
        }

        let mut tx = self.pool.begin().await?;

        let parent_type: Option<String> = sqlx::query_scalar(
            r#"
            SELECT type FROM exercise
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(parent_id)
        .fetch_optional(&mut *tx)
        .await?;

        match parent_type.as_deref() {
            None => return Err(ApiError::NotFound(format!("exercise {}", parent_id))),
            Some("compound") => {}
            Some(_) => {
                return Err(ApiError::BadRequest(
                    "components can only be added to compound exercises".to_string(),
                ))
            }
        }

        let child_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM exercise WHERE id = $1)
            "#,
        )
        .bind(child_id)
        .fetch_one(&mut *tx)
        .await?;

        if !child_exists {
            return Err(ApiError::NotFound(format!("exercise {}", child_id)));
        }

        let edges: Vec<(Uuid, Uuid)> = sqlx::query_as(
            r#"
            SELECT parent_exercise_id, child_exercise_id
            FROM compound_exercise_component
            "#,
        )
        .fetch_all(&mut *tx)
        .await?;

        CompositionGraph::from_edges(edges).check_new_edge(parent_id, child_id)?;

        let order_index = match request.order_index {
            Some(order_index) => order_index,
            None => {
                let existing: Vec<i32> = sqlx::query_scalar(
                    r#"
                    SELECT order_index FROM compound_exercise_component
                    WHERE parent_exercise_id = $1
                    "#,
                )
                .bind(parent_id)
                .fetch_all(&mut *tx)
                .await?;
                next_order_index(&existing)
            }
        };

        let component = sqlx::query_as::<_, DbComponent>(
            r#"
            INSERT INTO compound_exercise_component
                (parent_exercise_id, child_exercise_id, quantity, order_index)
            VALUES ($1, $2, $3, $4)
            RETURNING id, parent_exercise_id, child_exercise_id, quantity, order_index
            "#,
        )
        .bind(parent_id)
        .bind(child_id)
        .bind(request.quantity)
        .bind(order_index)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(component)
    }

    /// Overwrite a component's quantity and/or order index. The linkage is
    /// unchanged, so no cycle re-check is needed.
    pub async fn update_component(
        &self,
        id: Uuid,
        request: &UpdateComponentRequest,
    ) -> Result<DbComponent> {
        if let Some(quantity) = request.quantity {
            if quantity < 1 {
                return Err(CompositionError::InvalidQuantity(quantity).into());
            }
        }
        if let Some(order_index) = request.order_index {
            if order_index < 1 {
                return Err(CompositionError::InvalidOrderIndex(order_index).into());
            }
        }

        let component = sqlx::query_as::<_, DbComponent>(
            r#"
            UPDATE compound_exercise_component
            SET quantity = COALESCE($2, quantity),
                order_index = COALESCE($3, order_index)
            WHERE id = $1
            RETURNING id, parent_exercise_id, child_exercise_id, quantity, order_index
            "#,
        )
        .bind(id)
        .bind(request.quantity)
        .bind(request.order_index)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("component {}", id)))?;

        Ok(component)
    }

    /// Delete a component row. Idempotent: deleting a missing row reports
    /// false instead of failing. Siblings keep their indices; gaps are fine.
    pub async fn delete_component(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM compound_exercise_component
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Exchange two components' positions without any write colliding with
    /// the unique `(parent_exercise_id, order_index)` constraint.
    ///
    /// The three-phase sentinel dance runs inside one transaction, so a
    /// failure at any phase rolls back and no component is ever observed
    /// parked at the sentinel.
    pub async fn swap_component_order(&self, request: &SwapOrderRequest) -> Result<()> {
        let steps = swap_steps(
            request.component_a,
            request.new_order_a,
            request.component_b,
            request.new_order_b,
        )?;

        let mut tx = self.pool.begin().await?;

        let components = sqlx::query_as::<_, DbComponent>(
            r#"
            SELECT id, parent_exercise_id, child_exercise_id, quantity, order_index
            FROM compound_exercise_component
            WHERE id = ANY($1)
            FOR UPDATE
            "#,
        )
        .bind(&[request.component_a, request.component_b][..])
        .fetch_all(&mut *tx)
        .await?;

        if components.len() != 2 {
            let missing = [request.component_a, request.component_b]
                .into_iter()
                .find(|id| !components.iter().any(|c| c.id == *id))
                .unwrap_or(request.component_a);
            return Err(ApiError::NotFound(format!("component {}", missing)));
        }

        if components[0].parent_exercise_id != components[1].parent_exercise_id {
            return Err(ApiError::BadRequest(
                "components belong to different parents".to_string(),
            ));
        }

        // The unique constraint is checked per statement even inside a
        // transaction, so the writes must follow the collision-free plan.
        for step in steps {
            sqlx::query(
                r#"
                UPDATE compound_exercise_component
                SET order_index = $2
                WHERE id = $1
                "#,
            )
            .bind(step.component_id)
            .bind(step.order_index)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Resolve a compound exercise into its ordered component list with
    /// child exercises attached via one batched lookup.
    pub async fn get_compound_exercise(
        &self,
        id: Uuid,
        policy: MissingChildPolicy,
    ) -> Result<Option<CompoundExercise>> {
        let Some(exercise) = self.get_exercise(id).await? else {
            return Ok(None);
        };
        if exercise.exercise_type != "compound" {
            return Ok(None);
        }

        let components: Vec<CompoundComponent> = self
            .get_components_by_parent(id)
            .await?
            .iter()
            .map(DbComponent::to_component)
            .collect();

        let mut child_ids: Vec<Uuid> = components.iter().map(|c| c.child_exercise_id).collect();
        child_ids.sort_unstable();
        child_ids.dedup();

        let children = self.get_exercises_by_ids(&child_ids).await?;

        Ok(Some(assemble_compound(
            exercise.to_exercise(),
            components,
            children,
            policy,
        )))
    }

    // === Routine Repository ===

    /// Create a routine
    pub async fn create_routine(&self, request: &CreateRoutineRequest) -> Result<Routine> {
        let routine = sqlx::query_as::<_, Routine>(
            r#"
            INSERT INTO routine (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(routine)
    }

    /// Get routine by ID
    pub async fn get_routine(&self, id: Uuid) -> Result<Option<Routine>> {
        let routine = sqlx::query_as::<_, Routine>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM routine
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(routine)
    }

    /// Get all routines, newest first
    pub async fn get_all_routines(&self) -> Result<Vec<Routine>> {
        let routines = sqlx::query_as::<_, Routine>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM routine
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(routines)
    }

    /// Update a routine's name/description
    pub async fn update_routine(
        &self,
        id: Uuid,
        request: &UpdateRoutineRequest,
    ) -> Result<Option<Routine>> {
        let routine = sqlx::query_as::<_, Routine>(
            r#"
            UPDATE routine
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.description)
        .fetch_optional(&self.pool)
        .await?;

        Ok(routine)
    }

    /// Delete a routine; its routine_exercise rows cascade
    pub async fn delete_routine(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM routine
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Routine with its exercises resolved: rows ordered by position,
    /// exercise records attached via one batched lookup.
    pub async fn get_routine_with_exercises(
        &self,
        id: Uuid,
    ) -> Result<Option<RoutineWithExercises>> {
        let Some(routine) = self.get_routine(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, RoutineExercise>(
            r#"
            SELECT id, routine_id, exercise_id, order_index,
                   sets, reps, duration, rest_time, notes
            FROM routine_exercise
            WHERE routine_id = $1
            ORDER BY order_index
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut exercise_ids: Vec<Uuid> = rows.iter().map(|r| r.exercise_id).collect();
        exercise_ids.sort_unstable();
        exercise_ids.dedup();

        let exercises = self.get_exercises_by_ids(&exercise_ids).await?;

        let routine_exercises = rows
            .into_iter()
            .map(|row| {
                let exercise = exercises.get(&row.exercise_id).cloned();
                RoutineExerciseWithDetail {
                    routine_exercise: row,
                    exercise,
                }
            })
            .collect();

        Ok(Some(RoutineWithExercises {
            routine,
            routine_exercises,
        }))
    }

    /// Add an exercise to a routine. The routine row is locked so the
    /// max+1 order-index allocation cannot race a concurrent add.
    pub async fn add_routine_exercise(
        &self,
        routine_id: Uuid,
        request: &AddRoutineExerciseRequest,
    ) -> Result<RoutineExercise> {
        let mut tx = self.pool.begin().await?;

        let routine_exists: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM routine
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(routine_id)
        .fetch_optional(&mut *tx)
        .await?;

        if routine_exists.is_none() {
            return Err(ApiError::NotFound(format!("routine {}", routine_id)));
        }

        let exercise_exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (SELECT 1 FROM exercise WHERE id = $1)
            "#,
        )
        .bind(request.exercise_id)
        .fetch_one(&mut *tx)
        .await?;

        if !exercise_exists {
            return Err(ApiError::NotFound(format!("exercise {}", request.exercise_id)));
        }

        let existing: Vec<i32> = sqlx::query_scalar(
            r#"
            SELECT order_index FROM routine_exercise
            WHERE routine_id = $1
            "#,
        )
        .bind(routine_id)
        .fetch_all(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, RoutineExercise>(
            r#"
            INSERT INTO routine_exercise
                (routine_id, exercise_id, order_index, sets, reps, duration, rest_time, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, routine_id, exercise_id, order_index,
                      sets, reps, duration, rest_time, notes
            "#,
        )
        .bind(routine_id)
        .bind(request.exercise_id)
        .bind(next_order_index(&existing))
        .bind(request.sets)
        .bind(request.reps)
        .bind(request.duration)
        .bind(request.rest_time)
        .bind(&request.notes)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(row)
    }

    /// Update a routine exercise's attributes
    pub async fn update_routine_exercise(
        &self,
        id: Uuid,
        request: &UpdateRoutineExerciseRequest,
    ) -> Result<RoutineExercise> {
        let row = sqlx::query_as::<_, RoutineExercise>(
            r#"
            UPDATE routine_exercise
            SET order_index = COALESCE($2, order_index),
                sets = COALESCE($3, sets),
                reps = COALESCE($4, reps),
                duration = COALESCE($5, duration),
                rest_time = COALESCE($6, rest_time),
                notes = COALESCE($7, notes)
            WHERE id = $1
            RETURNING id, routine_id, exercise_id, order_index,
                      sets, reps, duration, rest_time, notes
            "#,
        )
        .bind(id)
        .bind(request.order_index)
        .bind(request.sets)
        .bind(request.reps)
        .bind(request.duration)
        .bind(request.rest_time)
        .bind(&request.notes)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("routine exercise {}", id)))?;

        Ok(row)
    }

    /// Remove an exercise from a routine. Idempotent like component removal.
    pub async fn remove_routine_exercise(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM routine_exercise
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Bulk reorder a routine's exercises. Two passes inside one
    /// transaction: every listed row is first shifted far out of range,
    /// then set to its final index, so no individual write collides with
    /// the unique `(routine_id, order_index)` constraint.
    pub async fn reorder_routine_exercises(
        &self,
        routine_id: Uuid,
        positions: &[ReorderEntry],
    ) -> Result<()> {
        for entry in positions {
            if entry.order_index < 1 {
                return Err(CompositionError::InvalidOrderIndex(entry.order_index).into());
            }
        }

        let mut tx = self.pool.begin().await?;

        let routine_exists: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM routine
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(routine_id)
        .fetch_optional(&mut *tx)
        .await?;

        if routine_exists.is_none() {
            return Err(ApiError::NotFound(format!("routine {}", routine_id)));
        }

        for entry in positions {
            let result = sqlx::query(
                r#"
                UPDATE routine_exercise
                SET order_index = order_index + $3
                WHERE id = $1 AND routine_id = $2
                "#,
            )
            .bind(entry.id)
            .bind(routine_id)
            .bind(exercise_core::SENTINEL_ORDER_INDEX)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(ApiError::NotFound(format!("routine exercise {}", entry.id)));
            }
        }

        for entry in positions {
            sqlx::query(
                r#"
                UPDATE routine_exercise
                SET order_index = $3
                WHERE id = $1 AND routine_id = $2
                "#,
            )
            .bind(entry.id)
            .bind(routine_id)
            .bind(entry.order_index)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Copy a routine and all its exercise rows under a new name
    pub async fn duplicate_routine(&self, id: Uuid, new_name: &str) -> Result<Routine> {
        let mut tx = self.pool.begin().await?;

        let original = sqlx::query_as::<_, Routine>(
            r#"
            SELECT id, name, description, created_at, updated_at
            FROM routine
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("routine {}", id)))?;

        let copy = sqlx::query_as::<_, Routine>(
            r#"
            INSERT INTO routine (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description, created_at, updated_at
            "#,
        )
        .bind(new_name)
        .bind(&original.description)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO routine_exercise
                (routine_id, exercise_id, order_index, sets, reps, duration, rest_time, notes)
            SELECT $2, exercise_id, order_index, sets, reps, duration, rest_time, notes
            FROM routine_exercise
            WHERE routine_id = $1
            "#,
        )
        .bind(id)
        .bind(copy.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(copy)
    }
}
