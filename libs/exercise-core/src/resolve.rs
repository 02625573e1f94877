//! Assembly of a resolved compound exercise from fetched rows.

use std::collections::HashMap;

use uuid::Uuid;

use crate::types::{CompoundComponent, CompoundExercise, Exercise, ResolvedComponent};

/// What to do with a component whose child exercise no longer exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingChildPolicy {
    /// Return the component with `child_exercise` absent.
    #[default]
    Keep,
    /// Drop the component from the resolved list.
    Skip,
}

impl MissingChildPolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "keep" => Some(Self::Keep),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

/// Attach child exercises to a parent's component rows.
///
/// Components come back sorted by `order_index` ascending regardless of
/// input order. A missing child never fails the whole resolution; it is
/// kept or skipped per `policy`.
pub fn assemble_compound(
    exercise: Exercise,
    mut components: Vec<CompoundComponent>,
    children: HashMap<Uuid, Exercise>,
    policy: MissingChildPolicy,
) -> CompoundExercise {
    components.sort_by_key(|c| c.order_index);

    let components = components
        .into_iter()
        .filter_map(|component| {
            let child_exercise = children.get(&component.child_exercise_id).cloned();
            if child_exercise.is_none() && policy == MissingChildPolicy::Skip {
                return None;
            }
            Some(ResolvedComponent {
                component,
                child_exercise,
            })
        })
        .collect();

    CompoundExercise {
        exercise,
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExerciseType;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn exercise(name: &str, exercise_type: ExerciseType) -> Exercise {
        Exercise {
            id: Uuid::new_v4(),
            name: name.to_string(),
            exercise_type,
            description: None,
            created_at: Utc::now(),
        }
    }

    fn component(parent: Uuid, child: Uuid, order_index: i32) -> CompoundComponent {
        CompoundComponent {
            id: Uuid::new_v4(),
            parent_exercise_id: parent,
            child_exercise_id: child,
            quantity: 1,
            order_index,
        }
    }

    #[test]
    fn components_sorted_by_order_index() {
        let parent = exercise("circuit", ExerciseType::Compound);
        let a = exercise("push-ups", ExerciseType::Simple);
        let b = exercise("squats", ExerciseType::Simple);

        let rows = vec![
            component(parent.id, b.id, 4),
            component(parent.id, a.id, 1),
        ];
        let children = HashMap::from([(a.id, a.clone()), (b.id, b.clone())]);

        let resolved =
            assemble_compound(parent, rows, children, MissingChildPolicy::Keep);

        let order: Vec<i32> = resolved
            .components
            .iter()
            .map(|c| c.component.order_index)
            .collect();
        assert_eq!(order, vec![1, 4]);
        assert_eq!(
            resolved.components[0].child_exercise.as_ref().unwrap().id,
            a.id
        );
    }

    #[test]
    fn dangling_child_kept_without_exercise() {
        let parent = exercise("circuit", ExerciseType::Compound);
        let gone = Uuid::new_v4();
        let rows = vec![component(parent.id, gone, 1)];

        let resolved =
            assemble_compound(parent, rows, HashMap::new(), MissingChildPolicy::Keep);

        assert_eq!(resolved.components.len(), 1);
        assert!(resolved.components[0].child_exercise.is_none());
    }

    #[test]
    fn dangling_child_skipped_under_skip_policy() {
        let parent = exercise("circuit", ExerciseType::Compound);
        let live = exercise("plank", ExerciseType::Simple);
        let gone = Uuid::new_v4();
        let rows = vec![
            component(parent.id, gone, 1),
            component(parent.id, live.id, 2),
        ];
        let children = HashMap::from([(live.id, live.clone())]);

        let resolved =
            assemble_compound(parent, rows, children, MissingChildPolicy::Skip);

        assert_eq!(resolved.components.len(), 1);
        assert_eq!(
            resolved.components[0].child_exercise.as_ref().unwrap().id,
            live.id
        );
    }

    #[test]
    fn duplicate_child_resolves_each_row() {
        // The same child may appear at several positions with different
        // quantities.
        let parent = exercise("intervals", ExerciseType::Compound);
        let sprint = exercise("sprint", ExerciseType::Simple);
        let rows = vec![
            component(parent.id, sprint.id, 1),
            component(parent.id, sprint.id, 2),
        ];
        let children = HashMap::from([(sprint.id, sprint.clone())]);

        let resolved =
            assemble_compound(parent, rows, children, MissingChildPolicy::Keep);

        assert_eq!(resolved.components.len(), 2);
        assert!(resolved
            .components
            .iter()
            .all(|c| c.child_exercise.as_ref().unwrap().id == sprint.id));
    }
}
