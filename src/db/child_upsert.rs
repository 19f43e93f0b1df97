/*!
 * Keyed child upserts
 *
 * Reconciles a list of incoming child entries against the children a parent
 * already owns. Each entry is matched by key: a match is updated in place,
 * anything else is inserted under the parent. Children that are not named by
 * the incoming list are left alone; nothing is ever deleted.
 */

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
};
use std::collections::HashMap;
use std::hash::Hash;
use uuid::Uuid;

/// Row type written for an incoming child of type `I`
pub type ChildModel<I> =
    <<<I as KeyedChild>::ActiveModel as ActiveModelTrait>::Entity as EntityTrait>::Model;

/// An incoming child entry that can be matched to a stored child by key.
pub trait KeyedChild: Sized {
    type ActiveModel: ActiveModelTrait + ActiveModelBehavior + Send + 'static;
    type Key: Eq + Hash;

    /// Key of this incoming entry
    fn key(&self) -> Self::Key;

    /// Key of an already stored child
    fn stored_key(model: &ChildModel<Self>) -> Self::Key;

    /// Overwrite every non-key field of a stored child with this entry
    fn merge_into(self, model: Self::ActiveModel) -> Self::ActiveModel;

    /// Build a new child owned by `parent_id`
    fn into_child(self, parent_id: Uuid) -> Self::ActiveModel;
}

/// A single write decided by [`plan_child_writes`].
#[derive(Debug, PartialEq)]
pub enum ChildWrite<M, I> {
    Update { existing: M, incoming: I },
    Insert(I),
}

/// Decides, without touching storage, which incoming entries update an
/// existing child and which create a new one.
///
/// Entries sharing a key collapse into the last one, keeping the position of
/// the first. The result equals applying the entries one by one.
pub fn plan_child_writes<K, M, I>(
    existing: Vec<M>,
    incoming: Vec<I>,
    existing_key: impl Fn(&M) -> K,
    incoming_key: impl Fn(&I) -> K,
) -> Vec<ChildWrite<M, I>>
where
    K: Eq + Hash,
{
    let mut positions: HashMap<K, usize> = HashMap::new();
    let mut collapsed: Vec<(K, I)> = Vec::with_capacity(incoming.len());

    for entry in incoming {
        match positions.get(&incoming_key(&entry)) {
            Some(&index) => collapsed[index].1 = entry,
            None => {
                positions.insert(incoming_key(&entry), collapsed.len());
                collapsed.push((incoming_key(&entry), entry));
            }
        }
    }

    let mut stored: HashMap<K, M> = existing
        .into_iter()
        .map(|model| (existing_key(&model), model))
        .collect();

    collapsed
        .into_iter()
        .map(|(key, entry)| match stored.remove(&key) {
            Some(existing) => ChildWrite::Update {
                existing,
                incoming: entry,
            },
            None => ChildWrite::Insert(entry),
        })
        .collect()
}

/// Applies `incoming` to the children of `parent_id` on `conn`.
///
/// `existing` must hold the children currently stored for the parent. Run it
/// on the same transaction that wrote the parent. Returns the written rows in
/// the order they were applied.
pub async fn upsert_children_by_key<C, I>(
    conn: &C,
    parent_id: Uuid,
    existing: Vec<ChildModel<I>>,
    incoming: Vec<I>,
) -> Result<Vec<ChildModel<I>>, DbErr>
where
    C: ConnectionTrait,
    I: KeyedChild,
    ChildModel<I>: IntoActiveModel<I::ActiveModel>,
{
    let writes = plan_child_writes(existing, incoming, I::stored_key, I::key);
    let mut written = Vec::with_capacity(writes.len());

    for write in writes {
        let model = match write {
            ChildWrite::Update { existing, incoming } => {
                incoming
                    .merge_into(existing.into_active_model())
                    .update(conn)
                    .await?
            }
            ChildWrite::Insert(incoming) => incoming.into_child(parent_id).insert(conn).await?,
        };
        written.push(model);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Stored {
        key: &'static str,
        value: i32,
    }

    #[derive(Debug, PartialEq)]
    struct Entry {
        key: &'static str,
        value: i32,
    }

    fn plan(existing: Vec<Stored>, incoming: Vec<Entry>) -> Vec<ChildWrite<Stored, Entry>> {
        plan_child_writes(existing, incoming, |s| s.key, |e| e.key)
    }

    #[test]
    fn matches_update_and_misses_insert() {
        let writes = plan(
            vec![Stored { key: "icu", value: 10 }],
            vec![Entry { key: "icu", value: 20 }, Entry { key: "general", value: 5 }],
        );

        assert_eq!(
            writes,
            vec![
                ChildWrite::Update {
                    existing: Stored { key: "icu", value: 10 },
                    incoming: Entry { key: "icu", value: 20 },
                },
                ChildWrite::Insert(Entry { key: "general", value: 5 }),
            ]
        );
    }

    #[test]
    fn duplicate_keys_keep_last_entry_at_first_position() {
        let writes = plan(
            vec![],
            vec![
                Entry { key: "icu", value: 1 },
                Entry { key: "general", value: 2 },
                Entry { key: "icu", value: 3 },
            ],
        );

        assert_eq!(
            writes,
            vec![
                ChildWrite::Insert(Entry { key: "icu", value: 3 }),
                ChildWrite::Insert(Entry { key: "general", value: 2 }),
            ]
        );
    }

    #[test]
    fn unnamed_children_are_not_touched() {
        let writes = plan(
            vec![Stored { key: "icu", value: 10 }, Stored { key: "hostel", value: 4 }],
            vec![Entry { key: "hostel", value: 6 }],
        );

        assert_eq!(writes.len(), 1);
        assert!(matches!(
            &writes[0],
            ChildWrite::Update { existing, .. } if existing.key == "hostel"
        ));
    }

    #[test]
    fn empty_incoming_plans_nothing() {
        assert!(plan(vec![Stored { key: "icu", value: 1 }], vec![]).is_empty());
    }
}
