//! Demand calculation
//!
//! A [`DemandPlan`] is rebuilt from scratch for every answer history by
//! walking the program's consumption order: sites before the loop, then each
//! loop iteration (nested iterations row-major inside it), then sites after
//! the loop. Counts are resolved from answers already given, so a slot at
//! position `k` depends only on the first `k` answers and earlier slots never
//! change when more answers arrive.
//!
//! The walk stops early in two cases:
//! - a loop bound names an input that has been asked but not answered
//!   ([`PlanStatus::Pending`])
//! - the count cannot be known at all: an opaque bound, a non-integer answer,
//!   an undelimited body or too many slots ([`PlanStatus::OpenEnded`])

use super::constants::MAX_PLAN_SLOTS;
use super::extractor::Structure;
use super::prompts::PromptRecord;
use crate::grammar::{BoundExpr, LoopKind, LoopSignature, Span, TripCount};
use rustc_hash::FxHashMap;
use tracing::debug;

/// Loop position of a slot: `inner` is set for slots in the nested loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iteration {
    pub outer: u64,
    pub inner: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSlot {
    pub prompt: PromptRecord,
    pub iteration: Option<Iteration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStatus {
    /// Every slot is known
    Complete,
    /// More slots depend on the answer to an outstanding question about `variable`
    Pending { variable: String },
    /// Remaining values must be collected manually
    OpenEnded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemandPlan {
    pub slots: Vec<PlanSlot>,
    pub status: PlanStatus,
}

impl DemandPlan {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.status == PlanStatus::Complete
    }

    pub fn is_open_ended(&self) -> bool {
        self.status == PlanStatus::OpenEnded
    }
}

/// Builds plans for one analysed source
#[derive(Debug, Clone, Copy)]
pub struct DemandCalculator<'a> {
    structure: &'a Structure,
    prompts: &'a [PromptRecord],
}

impl<'a> DemandCalculator<'a> {
    pub fn new(structure: &'a Structure, prompts: &'a [PromptRecord]) -> Self {
        DemandCalculator { structure, prompts }
    }

    /// Plan for the given answer history
    pub fn plan(&self, answers: &[String]) -> DemandPlan {
        let mut walk = Walk {
            structure: self.structure,
            prompts: self.prompts,
            answers,
            slots: Vec::new(),
            bound: FxHashMap::default(),
        };
        let status = match walk.run() {
            Ok(()) => PlanStatus::Complete,
            Err(Halt::Pending(variable)) => PlanStatus::Pending { variable },
            Err(Halt::OpenEnded) => PlanStatus::OpenEnded,
        };
        debug!(answers = answers.len(), slots = walk.slots.len(), status = ?status, "plan recomputed");
        DemandPlan {
            slots: walk.slots,
            status,
        }
    }
}

enum Halt {
    Pending(String),
    OpenEnded,
}

/// Value of a name as seen at the current point of the walk
enum Binding {
    Value(i64),
    Garbled,
    Unanswered,
}

/// Element of a loop body in source order
enum Segment {
    Site(usize),
    Nested,
}

/// A loop together with the layout of its body
struct LoopPlan<'s> {
    signature: &'s LoopSignature,
    segments: Vec<Segment>,
}

struct Walk<'a> {
    structure: &'a Structure,
    prompts: &'a [PromptRecord],
    answers: &'a [String],
    slots: Vec<PlanSlot>,
    bound: FxHashMap<String, Binding>,
}

impl<'a> Walk<'a> {
    fn run(&mut self) -> Result<(), Halt> {
        let structure = self.structure;
        let count = self.prompts.len();

        let Some(top) = structure.top_loop.as_ref() else {
            return (0..count).try_for_each(|idx| self.emit(idx, None));
        };

        let Some(body) = top.body else {
            // Only the sites ahead of the loop header are certain
            for idx in 0..count {
                if self.start(idx) >= top.header.start {
                    debug!("loop body undelimited; switching to manual entry");
                    return Err(Halt::OpenEnded);
                }
                self.emit(idx, None)?;
            }
            return Ok(());
        };

        let inside: Vec<usize> = (0..count).filter(|&i| self.prompts[i].site.inside_loop).collect();
        let before = (0..count).filter(|&i| !self.prompts[i].site.inside_loop && self.start(i) < body.start);
        let after = (0..count).filter(|&i| !self.prompts[i].site.inside_loop && self.start(i) >= body.start);
        let (before, after): (Vec<usize>, Vec<usize>) = (before.collect(), after.collect());

        for idx in before {
            self.emit(idx, None)?;
        }

        let (outer, inner) = self.layout(top, body, &inside);
        self.run_loop(&outer, inner.as_ref(), None)?;

        for idx in after {
            self.emit(idx, None)?;
        }
        Ok(())
    }

    /// Split the loop sites between the outer body and the nested loop
    fn layout(
        &self,
        top: &'a LoopSignature,
        body: Span,
        inside: &[usize],
    ) -> (LoopPlan<'a>, Option<LoopPlan<'a>>) {
        let nested = self.structure.nested_loop.as_ref();
        let region = nested.map(|n| n.body.unwrap_or(Span::new(n.header.start, body.end)));

        let mut outer = Vec::new();
        let mut inner = Vec::new();
        for &idx in inside {
            if region.is_some_and(|r| r.contains(self.start(idx))) {
                if inner.is_empty() {
                    outer.push(Segment::Nested);
                }
                inner.push(Segment::Site(idx));
            } else {
                outer.push(Segment::Site(idx));
            }
        }

        let inner = nested
            .filter(|_| !inner.is_empty())
            .map(|signature| LoopPlan {
                signature,
                segments: inner,
            });
        (
            LoopPlan {
                signature: top,
                segments: outer,
            },
            inner,
        )
    }

    /// Emit every iteration of one loop. `outer` is the enclosing iteration
    /// when this is the nested loop.
    fn run_loop(
        &mut self,
        plan: &LoopPlan<'a>,
        nested: Option<&LoopPlan<'a>>,
        outer: Option<u64>,
    ) -> Result<(), Halt> {
        if plan.segments.is_empty() {
            return Ok(());
        }
        let trip = &plan.signature.trip;
        let floor = u64::from(plan.signature.kind == LoopKind::DoWhile);

        // Bound first read inside this body: count it after that read
        let late_bound = self.late_bound(trip, &plan.segments);
        let mut count = match late_bound {
            Some(_) => None,
            None => Some(self.resolve(plan.signature)?.max(floor)),
        };

        let mut i = 0;
        while count.map_or(i == 0, |c| i < c) {
            for segment in &plan.segments {
                match segment {
                    Segment::Site(idx) => {
                        let iteration = match outer {
                            None => Iteration { outer: i, inner: None },
                            Some(o) => Iteration {
                                outer: o,
                                inner: Some(i),
                            },
                        };
                        self.emit(*idx, Some(iteration))?;
                        if count.is_none() && self.target(*idx) == late_bound {
                            count = Some(self.resolve(plan.signature)?.max(1));
                        }
                    }
                    Segment::Nested => {
                        let inner = nested.ok_or(Halt::OpenEnded)?;
                        if inner.signature.body.is_none() {
                            debug!("nested body undelimited; switching to manual entry");
                            return Err(Halt::OpenEnded);
                        }
                        self.run_loop(inner, None, Some(i))?;
                    }
                }
            }
            if count.is_none() {
                return Err(Halt::OpenEnded);
            }
            i += 1;
        }
        Ok(())
    }

    fn emit(&mut self, idx: usize, iteration: Option<Iteration>) -> Result<(), Halt> {
        if self.slots.len() >= MAX_PLAN_SLOTS {
            debug!(cap = MAX_PLAN_SLOTS, "plan truncated");
            return Err(Halt::OpenEnded);
        }
        let record = &self.prompts[idx];
        if let Some(target) = &record.site.target {
            let binding = match self.answers.get(self.slots.len()) {
                None => Binding::Unanswered,
                Some(answer) => answer
                    .trim()
                    .parse::<i64>()
                    .map_or(Binding::Garbled, Binding::Value),
            };
            self.bound.insert(target.clone(), binding);
        }
        self.slots.push(PlanSlot {
            prompt: record.clone(),
            iteration,
        });
        Ok(())
    }

    /// Iteration count from the most recent binding of the bound. Literal
    /// assignments only count when they precede the loop header.
    fn resolve(&self, signature: &LoopSignature) -> Result<u64, Halt> {
        let trip = &signature.trip;
        match &trip.bound {
            BoundExpr::Literal(v) => Ok(trip.iterations(*v)),
            BoundExpr::Identifier(name) => match self.bound.get(name) {
                Some(Binding::Value(v)) => Ok(trip.iterations(*v)),
                Some(Binding::Unanswered) => Err(Halt::Pending(name.clone())),
                Some(Binding::Garbled) => {
                    debug!(bound = %name, "bound answer is not an integer");
                    Err(Halt::OpenEnded)
                }
                None => match self.structure.literal_before(name, signature.header.start) {
                    Some(v) => Ok(trip.iterations(v)),
                    None => {
                        debug!(bound = %name, "bound has no known value");
                        Err(Halt::OpenEnded)
                    }
                },
            },
            BoundExpr::Opaque(text) => {
                debug!(bound = %text, "opaque loop bound");
                Err(Halt::OpenEnded)
            }
        }
    }

    /// The bound's name when it has no value yet but a site directly in
    /// `segments` reads it
    fn late_bound(&self, trip: &TripCount, segments: &[Segment]) -> Option<&'a str> {
        let BoundExpr::Identifier(name) = &trip.bound else {
            return None;
        };
        if self.bound.contains_key(name) {
            return None;
        }
        segments.iter().find_map(|segment| match segment {
            Segment::Site(idx) => self.target(*idx).filter(|t| *t == name),
            Segment::Nested => None,
        })
    }

    fn target(&self, idx: usize) -> Option<&'a str> {
        self.prompts[idx].site.target.as_deref()
    }

    fn start(&self, idx: usize) -> usize {
        self.prompts[idx].site.span.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{analyze, Analysis};

    fn answers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn texts(plan: &DemandPlan) -> Vec<&str> {
        plan.slots.iter().map(|s| s.prompt.text.as_str()).collect()
    }

    fn python(source: &str) -> Analysis {
        analyze("python", source).unwrap()
    }

    #[test]
    fn test_no_loop_emits_each_site_once() {
        let a = python("a = input(\"A: \")\nb = input(\"B: \")\nc = input()\n");
        let plan = a.plan(&[]);
        assert_eq!(texts(&plan), ["A: ", "B: ", "Enter value 3"]);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_literal_bound_multiplies_loop_inputs() {
        let a = python("for i in range(4):\n    a = input(\"a: \")\n    b = input(\"b: \")\n");
        let plan = a.plan(&[]);
        assert_eq!(plan.len(), 8);
        assert!(plan.is_complete());
        assert_eq!(texts(&plan)[..4], ["a: ", "b: ", "a: ", "b: "]);
        assert_eq!(plan.slots[7].iteration, Some(Iteration { outer: 3, inner: None }));
    }

    #[test]
    fn test_identifier_bound_pending_until_answered() {
        let a = python("n = int(input(\"How many? \"))\nfor i in range(n):\n    x = input(\"Item: \")\n");
        let first = a.plan(&[]);
        assert_eq!(first.len(), 1);
        assert_eq!(first.status, PlanStatus::Pending { variable: "n".into() });

        let full = a.plan(&answers(&["3"]));
        assert_eq!(texts(&full), ["How many? ", "Item: ", "Item: ", "Item: "]);
        assert!(full.is_complete());
        assert_eq!(first.slots[0], full.slots[0]);
    }

    #[test]
    fn test_prefix_never_changes() {
        let a = python(
            "rows = int(input())\nfor i in range(rows):\n    k = int(input())\n    for j in range(k):\n        v = input()\nend = input()\n",
        );
        let history = answers(&["2", "1", "x", "2", "y", "z", "done"]);
        let mut previous: Option<DemandPlan> = None;
        for k in 0..=history.len() {
            let plan = a.plan(&history[..k]);
            assert!(plan.len() > k || plan.is_complete());
            if let Some(prev) = &previous {
                assert!(plan.len() >= prev.len());
                assert_eq!(plan.slots[..k], prev.slots[..k]);
            }
            previous = Some(plan);
        }
        let last = previous.unwrap();
        assert_eq!(last.len(), 7);
        assert!(last.is_complete());
    }

    #[test]
    fn test_inner_count_evaluated_per_outer_iteration() {
        let a = python(
            "rows = int(input())\nfor i in range(rows):\n    k = int(input())\n    for j in range(k):\n        v = input()\n",
        );
        let plan = a.plan(&answers(&["2", "1", "a", "2"]));
        let iterations: Vec<_> = plan.slots.iter().map(|s| s.iteration).collect();
        assert_eq!(
            iterations,
            [
                None,
                Some(Iteration { outer: 0, inner: None }),
                Some(Iteration { outer: 0, inner: Some(0) }),
                Some(Iteration { outer: 1, inner: None }),
                Some(Iteration { outer: 1, inner: Some(0) }),
                Some(Iteration { outer: 1, inner: Some(1) }),
            ]
        );
    }

    #[test]
    fn test_nested_row_major() {
        let src = "int v;\nfor (int i = 0; i < 2; i++) {\n  for (int j = 0; j < 3; j++) {\n    scanf(\"%d\", &v);\n  }\n}\n";
        let a = analyze("c", src).unwrap();
        let plan = a.plan(&[]);
        assert_eq!(plan.len(), 6);
        let order: Vec<(u64, u64)> = plan
            .slots
            .iter()
            .filter_map(|s| s.iteration)
            .map(|it| (it.outer, it.inner.unwrap_or_default()))
            .collect();
        assert_eq!(order, [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }

    #[test]
    fn test_loop_without_inputs_adds_nothing() {
        let a = python("xs = [1, 2, 3]\nfor x in xs:\n    print(x)\nname = input()\n");
        let plan = a.plan(&[]);
        assert_eq!(plan.len(), 1);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_sites_after_loop_follow_loop_slots() {
        let a = python("for i in range(2):\n    v = input(\"v: \")\nlast = input(\"last: \")\n");
        assert_eq!(texts(&a.plan(&[])), ["v: ", "v: ", "last: "]);
    }

    #[test]
    fn test_non_integer_bound_is_open_ended() {
        let a = python("n = int(input())\nfor i in range(n):\n    x = input()\n");
        let plan = a.plan(&answers(&["many"]));
        assert_eq!(plan.len(), 1);
        assert!(plan.is_open_ended());
    }

    #[test]
    fn test_opaque_bound_with_loop_inputs_is_open_ended() {
        let a = python("first = input()\nfor line in sys.stdin:\n    x = input()\n");
        let plan = a.plan(&[]);
        assert_eq!(plan.len(), 1);
        assert!(plan.is_open_ended());
    }

    #[test]
    fn test_bound_read_inside_loop() {
        let a = python("for i in range(n):\n    n = int(input(\"n: \"))\n");
        let first = a.plan(&[]);
        assert_eq!(first.len(), 1);
        assert_eq!(first.status, PlanStatus::Pending { variable: "n".into() });

        let plan = a.plan(&answers(&["3"]));
        assert_eq!(plan.len(), 3);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_literal_binding_resolves_bound() {
        let src = "int n = 3;\nint x;\nfor (int i = 0; i < n; i++) scanf(\"%d\", &x);\n";
        let plan = analyze("c", src).unwrap().plan(&[]);
        assert_eq!(plan.len(), 3);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_assignment_after_loop_does_not_bind() {
        let plan = python("n = 3\nfor i in range(n):\n    x = input()\nn = 10\n").plan(&[]);
        assert_eq!(plan.len(), 3);
        assert!(plan.is_complete());

        let plan = python("for i in range(n):\n    x = input()\nn = 10\n").plan(&[]);
        assert!(plan.is_empty());
        assert!(plan.is_open_ended());
    }

    #[test]
    fn test_print_only_loop_does_not_hide_input_loop() {
        let a = python("n = int(input(\"n: \"))\nfor i in range(3):\n    print(i)\nfor j in range(n):\n    x = input(\"x: \")\n");
        let plan = a.plan(&answers(&["4"]));
        assert_eq!(texts(&plan), ["n: ", "x: ", "x: ", "x: ", "x: "]);
        assert!(plan.is_complete());
    }

    #[test]
    fn test_slot_cap_truncates() {
        let a = python("for i in range(5000):\n    x = input()\n");
        let plan = a.plan(&[]);
        assert_eq!(plan.len(), MAX_PLAN_SLOTS);
        assert!(plan.is_open_ended());
    }

    #[test]
    fn test_do_while_counter_runs_at_least_once() {
        let src = "int i = 5;\nint x;\ndo {\n  scanf(\"%d\", &x);\n  i++;\n} while (i < 3);\n";
        let plan = analyze("c", src).unwrap().plan(&[]);
        assert_eq!(plan.len(), 1);
        assert!(plan.is_complete());
    }
}
