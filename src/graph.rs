use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

pub type PersonId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// One node in the family graph. Relation fields hold ids, never object
/// references, so snapshots and serialization are plain set copies.
#[derive(Debug, Clone)]
pub struct Person {
    pub id: PersonId,
    /// External identity from the upstream system; guards duplicate adds.
    pub member_id: Option<String>,
    pub name: String,
    pub gender: Gender,
    pub age: Option<u32>,
    /// Lower = elder. Only meaningful among siblings of the same parent set.
    pub birth_order: Option<u32>,
    /// Derived by the generation assigner; never set by callers.
    pub generation: Option<i32>,
    pub x: f32,
    pub y: f32,
    pub parents: BTreeSet<PersonId>,
    pub children: BTreeSet<PersonId>,
    pub spouses: BTreeSet<PersonId>,
    /// Derived: the other children of any of this person's parents.
    pub siblings: BTreeSet<PersonId>,
}

impl Person {
    pub fn new(id: impl Into<PersonId>, name: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            member_id: None,
            name: name.into(),
            gender,
            age: None,
            birth_order: None,
            generation: None,
            x: 0.0,
            y: 0.0,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
            spouses: BTreeSet::new(),
            siblings: BTreeSet::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewPerson {
    pub member_id: Option<String>,
    pub name: String,
    pub gender: Gender,
    pub age: Option<u32>,
    pub birth_order: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(PersonId),
    /// A person with the same `member_id` already exists; the store is
    /// unchanged and the existing id is returned.
    Duplicate(PersonId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// First id is the parent, second the child.
    ParentChild,
    Spouse,
}

/// A raw structural mutation, applied through [`FamilyGraph::apply_edit`].
#[derive(Debug, Clone)]
pub enum Edit {
    AddPerson(NewPerson),
    AddRelation {
        from: PersonId,
        to: PersonId,
        kind: EdgeKind,
    },
    RemovePerson(PersonId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Added(PersonId),
    Duplicate(PersonId),
    Linked,
    Removed,
    /// The edit referenced an id absent from the store.
    NoOp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphStats {
    pub total: usize,
    pub males: usize,
    pub females: usize,
    pub unknown: usize,
    /// `max(generation) - min(generation) + 1` over defined generations.
    pub generation_span: i32,
}

/// Arena of people keyed by stable string id.
///
/// The store owns every `Person`; the resolver and layout engine read the
/// same instances and only ever write the derived `generation`/`x`/`y`
/// fields. Undo snapshots are a plain `clone()`.
#[derive(Debug, Clone, Default)]
pub struct FamilyGraph {
    pub people: BTreeMap<PersonId, Person>,
    next_id: u64,
}

impl FamilyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.people.contains_key(id)
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn person_mut(&mut self, id: &str) -> Option<&mut Person> {
        self.people.get_mut(id)
    }

    /// People with no recorded parents, in id order. Seeds of the
    /// generation-0 BFS.
    pub fn roots(&self) -> Vec<PersonId> {
        self.people
            .values()
            .filter(|person| person.parents.is_empty())
            .map(|person| person.id.clone())
            .collect()
    }

    fn allocate_id(&mut self) -> PersonId {
        loop {
            self.next_id += 1;
            let id = format!("p{}", self.next_id);
            if !self.people.contains_key(&id) {
                return id;
            }
        }
    }

    /// Adds a person under a freshly allocated id. Returns the duplicate
    /// signal instead of inserting when `member_id` already exists on
    /// another person. The first person added becomes the implicit root
    /// with generation 0.
    pub fn add_person(&mut self, new: NewPerson) -> AddOutcome {
        if let Some(member_id) = new.member_id.as_deref()
            && let Some(existing) = self
                .people
                .values()
                .find(|person| person.member_id.as_deref() == Some(member_id))
        {
            return AddOutcome::Duplicate(existing.id.clone());
        }
        let id = self.allocate_id();
        let mut person = Person::new(id.clone(), new.name, new.gender);
        person.member_id = new.member_id;
        person.age = new.age;
        person.birth_order = new.birth_order;
        if self.people.is_empty() {
            person.generation = Some(0);
        }
        self.people.insert(id.clone(), person);
        AddOutcome::Added(id)
    }

    /// Inserts a person under a caller-supplied id. Returns false (and
    /// leaves the store unchanged) when the id is already taken.
    pub fn insert_person(&mut self, person: Person) -> bool {
        if self.people.contains_key(&person.id) {
            return false;
        }
        self.people.insert(person.id.clone(), person);
        true
    }

    /// Adds a parent-child or spouse edge between two existing people.
    /// Requests naming an absent id, or relating a person to themselves,
    /// are no-ops.
    ///
    /// Parent-child sets `from` as parent of `to`, propagates `to`'s
    /// generation from the parent through its descendants, and rebuilds
    /// sibling sets. Spouse adds reciprocal entries and equalizes the two
    /// generations. Sibling edges are never added directly; they are
    /// always derived.
    pub fn add_relation(&mut self, from: &str, to: &str, kind: EdgeKind) {
        if from == to || !self.people.contains_key(from) || !self.people.contains_key(to) {
            return;
        }
        match kind {
            EdgeKind::ParentChild => {
                let parent_generation = self.people.get(from).and_then(|p| p.generation);
                if let Some(parent) = self.people.get_mut(from) {
                    parent.children.insert(to.to_string());
                }
                if let Some(child) = self.people.get_mut(to) {
                    child.parents.insert(from.to_string());
                    if let Some(generation) = parent_generation {
                        child.generation = Some(generation + 1);
                    }
                }
                if parent_generation.is_some() {
                    crate::generation::propagate_descendants(self, to);
                }
                self.rebuild_siblings();
            }
            EdgeKind::Spouse => {
                let from_generation = self.people.get(from).and_then(|p| p.generation);
                let to_generation = self.people.get(to).and_then(|p| p.generation);
                if let Some(person) = self.people.get_mut(from) {
                    person.spouses.insert(to.to_string());
                    if person.generation.is_none() {
                        person.generation = to_generation;
                    }
                }
                if let Some(person) = self.people.get_mut(to) {
                    person.spouses.insert(from.to_string());
                    if from_generation.is_some() {
                        person.generation = from_generation;
                    }
                }
            }
        }
    }

    /// Deletes a person and purges their id from every remaining relation
    /// set. Generations of the remaining people are NOT recomputed here:
    /// removing a bridging node can disconnect subtrees, so callers re-run
    /// the generation assigner (or use [`FamilyGraph::apply_edit`]).
    pub fn remove_person(&mut self, id: &str) -> Option<Person> {
        let removed = self.people.remove(id)?;
        for person in self.people.values_mut() {
            person.parents.remove(id);
            person.children.remove(id);
            person.spouses.remove(id);
            person.siblings.remove(id);
        }
        self.rebuild_siblings();
        Some(removed)
    }

    /// Re-derives every sibling set from the current parent-child edges:
    /// `siblings(a)` is exactly the set of other children of any of `a`'s
    /// parents.
    pub fn rebuild_siblings(&mut self) {
        let mut derived: BTreeMap<PersonId, BTreeSet<PersonId>> = BTreeMap::new();
        for person in self.people.values() {
            let mut siblings = BTreeSet::new();
            for parent_id in &person.parents {
                let Some(parent) = self.people.get(parent_id) else {
                    continue;
                };
                for child_id in &parent.children {
                    if child_id != &person.id {
                        siblings.insert(child_id.clone());
                    }
                }
            }
            derived.insert(person.id.clone(), siblings);
        }
        for (id, siblings) in derived {
            if let Some(person) = self.people.get_mut(&id) {
                person.siblings = siblings;
            }
        }
    }

    /// Two-phase commit: applies the raw edit, then always rebuilds the
    /// derived state (sibling sets and generations) so reads are valid
    /// immediately after.
    pub fn apply_edit(&mut self, edit: Edit) -> EditOutcome {
        let outcome = match edit {
            Edit::AddPerson(new) => match self.add_person(new) {
                AddOutcome::Added(id) => EditOutcome::Added(id),
                AddOutcome::Duplicate(id) => EditOutcome::Duplicate(id),
            },
            Edit::AddRelation { from, to, kind } => {
                if from == to || !self.contains(&from) || !self.contains(&to) {
                    EditOutcome::NoOp
                } else {
                    self.add_relation(&from, &to, kind);
                    EditOutcome::Linked
                }
            }
            Edit::RemovePerson(id) => {
                if self.remove_person(&id).is_some() {
                    EditOutcome::Removed
                } else {
                    EditOutcome::NoOp
                }
            }
        };
        self.rebuild_siblings();
        crate::generation::assign_generations(self);
        outcome
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total: self.people.len(),
            ..GraphStats::default()
        };
        let mut min_generation: Option<i32> = None;
        let mut max_generation: Option<i32> = None;
        for person in self.people.values() {
            match person.gender {
                Gender::Male => stats.males += 1,
                Gender::Female => stats.females += 1,
                Gender::Unknown => stats.unknown += 1,
            }
            if let Some(generation) = person.generation {
                min_generation = Some(min_generation.map_or(generation, |m| m.min(generation)));
                max_generation = Some(max_generation.map_or(generation, |m| m.max(generation)));
            }
        }
        if let (Some(min), Some(max)) = (min_generation, max_generation) {
            stats.generation_span = max - min + 1;
        }
        stats
    }
}
