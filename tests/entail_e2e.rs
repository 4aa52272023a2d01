use std::sync::Arc;

use ponens::{
    render_rule, ChainingStrategy, EngineConfig, EntailmentEngine, ExecutionError, Expression,
    InMemoryKnowledgeBase, KnowledgeSnapshot, PonensError, Predicate, PredicateId, Rule,
    TriState, TruthAssignment,
};

fn seed(pairs: &[(PredicateId, bool)]) -> TruthAssignment {
    pairs.iter().copied().collect()
}

struct Socrates {
    kb: Arc<InMemoryKnowledgeBase>,
    human: PredicateId,
    mortal: PredicateId,
    god: PredicateId,
}

fn socrates() -> Socrates {
    let kb = Arc::new(InMemoryKnowledgeBase::new());
    let human = kb.add_predicate("human", "is Human").unwrap();
    let mortal = kb.add_predicate("mortal", "is Mortal").unwrap();
    let god = kb.add_predicate("god", "is a God").unwrap();
    kb.add_predicate("immortal", "is Immortal").unwrap();

    let h_exp = kb.identity(human).unwrap();
    let m_exp = kb.identity(mortal).unwrap();
    let g_exp = kb.identity(god).unwrap();
    let i_exp = kb.not(m_exp).unwrap();

    kb.add_rule("example", "example rule", h_exp, m_exp).unwrap();
    kb.add_rule("immortal", "immortality rule", g_exp, i_exp).unwrap();

    Socrates {
        kb,
        human,
        mortal,
        god,
    }
}

#[test]
fn single_step_chaining() {
    let s = socrates();
    let engine = EntailmentEngine::with_defaults(s.kb.clone()).unwrap();

    let result = engine.closure(&seed(&[(s.human, true)])).unwrap();
    assert_eq!(result, seed(&[(s.human, true), (s.mortal, true)]));
}

#[test]
fn negated_consequent_derives_false() {
    let s = socrates();
    let engine = EntailmentEngine::with_defaults(s.kb.clone()).unwrap();

    let result = engine.closure(&seed(&[(s.god, true)])).unwrap();
    assert_eq!(result.get(s.mortal), TriState::False);
    assert_eq!(result.get(s.human), TriState::Unknown);
    assert_eq!(result.len(), 2);
}

#[test]
fn rules_render_with_labels() {
    let s = socrates();
    let snapshot = s.kb.snapshot().unwrap();
    let by_name = |name: &str| snapshot.rules.iter().find(|r| r.name == name).unwrap().id;

    assert_eq!(
        render_rule(s.kb.as_ref(), by_name("example")).unwrap(),
        "(is Human) => (is Mortal)"
    );
    assert_eq!(
        render_rule(s.kb.as_ref(), by_name("immortal")).unwrap(),
        "(is a God) => (NOT (is Mortal))"
    );
}

#[test]
fn conjunctive_rules_chain_to_closure() {
    let kb = Arc::new(InMemoryKnowledgeBase::new());
    let a = kb.add_predicate("a", "a").unwrap();
    let b = kb.add_predicate("b", "b").unwrap();
    let c = kb.add_predicate("c", "c").unwrap();
    let d = kb.add_predicate("d", "d").unwrap();
    let e = kb.add_predicate("e", "e").unwrap();

    let a_exp = kb.identity(a).unwrap();
    let b_exp = kb.identity(b).unwrap();
    let c_exp = kb.identity(c).unwrap();
    let d_exp = kb.identity(d).unwrap();
    let e_exp = kb.identity(e).unwrap();

    let ab = kb.and(vec![a_exp, b_exp]).unwrap();
    let ac = kb.and(vec![a_exp, c_exp]).unwrap();
    let ad = kb.and(vec![a_exp, d_exp]).unwrap();

    let r3 = kb.add_rule("r3", "a + b = c", ab, c_exp).unwrap();
    kb.add_rule("r4", "a + c = d", ac, d_exp).unwrap();
    kb.add_rule("r5", "a + d = e", ad, e_exp).unwrap();

    assert_eq!(render_rule(kb.as_ref(), r3).unwrap(), "(AND (a) (b)) => (c)");

    let engine = EntailmentEngine::with_defaults(kb).unwrap();
    let result = engine.entail(&seed(&[(a, true), (b, true)])).unwrap();
    for p in [a, b, c, d, e] {
        assert_eq!(result.assignment.get(p), TriState::True);
    }
    assert_eq!(result.stats.derived, 3);
    assert_eq!(result.stats.passes, 4);
}

#[test]
fn entail_is_monotone_and_idempotent() {
    let s = socrates();
    let engine = EntailmentEngine::with_defaults(s.kb.clone()).unwrap();

    let seeds = [
        seed(&[(s.human, true)]),
        seed(&[(s.god, true)]),
        seed(&[(s.human, false), (s.god, false)]),
        TruthAssignment::new(),
    ];
    for start in &seeds {
        let once = engine.closure(start).unwrap();
        assert!(once.extends(start));
        let twice = engine.closure(&once).unwrap();
        assert_eq!(twice, once);
    }
}

#[test]
fn undecidable_seed_is_returned_unchanged() {
    let kb = Arc::new(InMemoryKnowledgeBase::new());
    let a = kb.add_predicate("a", "a").unwrap();
    let b = kb.add_predicate("b", "b").unwrap();
    let c = kb.add_predicate("c", "c").unwrap();
    let a_exp = kb.identity(a).unwrap();
    let b_exp = kb.identity(b).unwrap();
    let c_exp = kb.identity(c).unwrap();
    let ab = kb.and(vec![a_exp, b_exp]).unwrap();
    let not_a = kb.not(a_exp).unwrap();
    kb.add_rule("needs-both", "a and b => c", ab, c_exp).unwrap();
    kb.add_rule("needs-not-a", "not a => c", not_a, c_exp).unwrap();

    let engine = EntailmentEngine::with_defaults(kb).unwrap();
    let start = seed(&[(a, true)]);
    assert_eq!(engine.closure(&start).unwrap(), start);
}

#[test]
fn disjunction_fires_on_any_true_child() {
    let kb = Arc::new(InMemoryKnowledgeBase::new());
    let rain = kb.add_predicate("rain", "it rains").unwrap();
    let sprinkler = kb.add_predicate("sprinkler", "sprinkler is on").unwrap();
    let wet = kb.add_predicate("wet", "grass is wet").unwrap();
    let rain_exp = kb.identity(rain).unwrap();
    let sprinkler_exp = kb.identity(sprinkler).unwrap();
    let wet_exp = kb.identity(wet).unwrap();
    let either = kb.or(vec![rain_exp, sprinkler_exp]).unwrap();
    kb.add_rule("wet-grass", "rain or sprinkler => wet", either, wet_exp).unwrap();

    let engine = EntailmentEngine::with_defaults(kb).unwrap();
    let result = engine.closure(&seed(&[(sprinkler, true)])).unwrap();
    assert_eq!(result.get(wet), TriState::True);

    let result = engine.closure(&seed(&[(rain, false)])).unwrap();
    assert_eq!(result.get(wet), TriState::Unknown);

    let result = engine.closure(&seed(&[(rain, false), (sprinkler, false)])).unwrap();
    assert_eq!(result.get(wet), TriState::Unknown);
}

#[test]
fn shared_subexpressions_fire_each_rule_once_per_pass() {
    // (a AND b) is shared by two parents, each the antecedent of a rule.
    let kb = Arc::new(InMemoryKnowledgeBase::new());
    let a = kb.add_predicate("a", "a").unwrap();
    let b = kb.add_predicate("b", "b").unwrap();
    let x = kb.add_predicate("x", "x").unwrap();
    let y = kb.add_predicate("y", "y").unwrap();
    let a_exp = kb.identity(a).unwrap();
    let b_exp = kb.identity(b).unwrap();
    let x_exp = kb.identity(x).unwrap();
    let y_exp = kb.identity(y).unwrap();
    let ab = kb.and(vec![a_exp, b_exp]).unwrap();
    let left = kb.or(vec![ab, a_exp]).unwrap();
    let right = kb.and(vec![ab, b_exp]).unwrap();
    kb.add_rule("left", "left", left, x_exp).unwrap();
    kb.add_rule("right", "right", right, y_exp).unwrap();

    let engine = EntailmentEngine::with_defaults(kb).unwrap();
    let result = engine.entail(&seed(&[(a, true), (b, true)])).unwrap();
    assert_eq!(result.assignment.get(x), TriState::True);
    assert_eq!(result.assignment.get(y), TriState::True);
    // Pass 1 sees both rules once each despite several paths; pass 2 has no
    // candidates because x and y appear in no antecedent.
    assert_eq!(result.stats.rules_evaluated, 2);
    assert_eq!(result.stats.passes, 2);
}

#[test]
fn frontier_and_full_rescan_agree() {
    let kb = InMemoryKnowledgeBase::new();
    let names = ["p0", "p1", "p2", "p3", "p4", "p5"];
    let preds: Vec<PredicateId> = names
        .iter()
        .map(|n| kb.add_predicate(*n, *n).unwrap())
        .collect();
    let exprs: Vec<_> = preds.iter().map(|p| kb.identity(*p).unwrap()).collect();

    // p0 => p1, (p0 and p1) => p2, (p2 or p5) => p3, not p4 => p5
    let p0p1 = kb.and(vec![exprs[0], exprs[1]]).unwrap();
    let p2p5 = kb.or(vec![exprs[2], exprs[5]]).unwrap();
    let not_p4 = kb.not(exprs[4]).unwrap();
    kb.add_rule("r1", "r1", exprs[0], exprs[1]).unwrap();
    kb.add_rule("r2", "r2", p0p1, exprs[2]).unwrap();
    kb.add_rule("r3", "r3", p2p5, exprs[3]).unwrap();
    kb.add_rule("r4", "r4", not_p4, exprs[5]).unwrap();
    let kb: Arc<InMemoryKnowledgeBase> = Arc::new(kb);

    let frontier = EntailmentEngine::new(
        kb.clone(),
        EngineConfig::default().with_strategy(ChainingStrategy::Frontier),
    )
    .unwrap();
    let rescan = EntailmentEngine::new(
        kb,
        EngineConfig::default().with_strategy(ChainingStrategy::FullRescan),
    )
    .unwrap();

    let seeds = [
        seed(&[(preds[0], true)]),
        seed(&[(preds[4], false)]),
        seed(&[(preds[0], true), (preds[4], false)]),
        seed(&[(preds[0], false), (preds[4], true)]),
    ];
    for start in &seeds {
        let a = frontier.entail(start).unwrap();
        let b = rescan.entail(start).unwrap();
        assert_eq!(a.assignment, b.assignment);
        assert!(a.stats.rules_evaluated <= b.stats.rules_evaluated);
    }
}

#[test]
fn json_snapshot_drives_inference() {
    let s = socrates();
    let json = s.kb.to_json().unwrap();

    let loaded = Arc::new(InMemoryKnowledgeBase::from_json(&json).unwrap());
    let engine = EntailmentEngine::with_defaults(loaded).unwrap();
    let result = engine.closure(&seed(&[(s.human, true)])).unwrap();
    assert_eq!(result.get(s.mortal), TriState::True);
}

#[test]
fn cyclic_antecedent_fails_instead_of_looping() {
    let p = Predicate::new("p", "p").unwrap();
    let q = Predicate::new("q", "q").unwrap();
    let p_exp = Expression::identity(p.id);
    let q_exp = Expression::identity(q.id);
    let mut loop_a = Expression::and(vec![p_exp.id]).unwrap();
    let loop_b = Expression::or(vec![loop_a.id]).unwrap();
    loop_a.children.push(loop_b.id);
    let rule = Rule::new("cyclic", "cyclic", loop_a.id, q_exp.id).unwrap();

    let kb = InMemoryKnowledgeBase::from_snapshot(KnowledgeSnapshot {
        predicates: vec![p.clone(), q],
        expressions: vec![p_exp, q_exp, loop_a, loop_b],
        rules: vec![rule],
    })
    .unwrap();

    let engine = EntailmentEngine::new(
        Arc::new(kb),
        EngineConfig::default().with_max_expression_depth(32),
    )
    .unwrap();
    let err = engine.entail(&seed(&[(p.id, true)])).unwrap_err();
    assert_eq!(
        err,
        PonensError::Execution(ExecutionError::ExpressionTooDeep { max_depth: 32 })
    );
}

#[test]
fn self_supporting_rules_terminate() {
    // a => b and b => a: monotone growth stops once both are known.
    let kb = Arc::new(InMemoryKnowledgeBase::new());
    let a = kb.add_predicate("a", "a").unwrap();
    let b = kb.add_predicate("b", "b").unwrap();
    let a_exp = kb.identity(a).unwrap();
    let b_exp = kb.identity(b).unwrap();
    kb.add_rule("ab", "a => b", a_exp, b_exp).unwrap();
    kb.add_rule("ba", "b => a", b_exp, a_exp).unwrap();

    let engine = EntailmentEngine::with_defaults(kb).unwrap();
    let result = engine.entail(&seed(&[(a, true)])).unwrap();
    assert_eq!(result.assignment, seed(&[(a, true), (b, true)]));
    assert_eq!(result.stats.passes, 2);
}
