//! Stratification schedule
//!
//! Groups the relations into strongly connected components and orders the
//! components so that every component comes after the ones it depends on.
//! The execution-plan check consumes the steps to count the recursive
//! versions of a clause within its stratum.

use std::collections::BTreeSet;

use datalog_ast::{Program, RelationName};

use crate::PrecedenceGraph;

#[derive(Debug, Clone)]
pub struct RelationScheduleStep {
    computed: BTreeSet<RelationName>,
}

impl RelationScheduleStep {
    /// The relations computed together in this step
    pub fn computed(&self) -> &BTreeSet<RelationName> {
        &self.computed
    }
}

#[derive(Debug, Clone)]
pub struct RelationSchedule {
    steps: Vec<RelationScheduleStep>,
}

impl RelationSchedule {
    pub fn build(program: &Program, precedence: &PrecedenceGraph) -> Self {
        let graph = precedence.graph();

        // strongly connected components, deduplicated by smallest member
        let mut components: Vec<BTreeSet<RelationName>> = Vec::new();
        let mut assigned: BTreeSet<RelationName> = BTreeSet::new();
        for relation in &program.relations {
            if assigned.contains(&relation.name) {
                continue;
            }
            let component = graph.clique(relation.name);
            assigned.extend(component.iter().copied());
            components.push(component);
        }

        // emit components whose external dependencies are already emitted
        let mut steps = Vec::new();
        let mut emitted: BTreeSet<RelationName> = BTreeSet::new();
        let mut remaining = components;
        while !remaining.is_empty() {
            let mut progressed = false;
            let mut deferred = Vec::new();
            for component in remaining {
                let ready = component.iter().all(|&member| {
                    graph
                        .vertices()
                        .filter(|&dep| graph.successors(dep).any(|s| s == member))
                        .all(|dep| component.contains(&dep) || emitted.contains(&dep))
                });
                if ready {
                    emitted.extend(component.iter().copied());
                    steps.push(RelationScheduleStep {
                        computed: component,
                    });
                    progressed = true;
                } else {
                    deferred.push(component);
                }
            }
            if !progressed {
                // dependency cycle across components cannot happen; bail
                // out rather than loop forever on an inconsistent graph
                for component in deferred.drain(..) {
                    steps.push(RelationScheduleStep {
                        computed: component,
                    });
                }
                break;
            }
            remaining = deferred;
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[RelationScheduleStep] {
        &self.steps
    }
}
