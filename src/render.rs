//! Textual rendering of expressions and rules for fixtures and debugging.
//!
//! Identity expressions render as `(label)`, compound ones as
//! `(OP child child ...)`, rules as `antecedent => consequent`. This is a
//! display form only; nothing parses it back.

use crate::config::EngineConfig;
use crate::error::{ExecutionError, PonensError, PonensResult};
use crate::expression::{ExpressionId, Operator};
use crate::rule::RuleId;
use crate::storage::KnowledgeBase;

/// Renders an expression using predicate labels.
///
/// # Errors
/// Lookup failures, `MalformedExpression`, or `ExpressionTooDeep` for
/// cyclic graphs.
pub fn render_expression(kb: &dyn KnowledgeBase, id: ExpressionId) -> PonensResult<String> {
    let mut out = String::new();
    write_expression(kb, id, 0, EngineConfig::default().max_expression_depth, &mut out)?;
    Ok(out)
}

/// Renders a rule as `antecedent => consequent`.
///
/// # Errors
/// `RuleNotFound`, or anything [`render_expression`] returns.
pub fn render_rule(kb: &dyn KnowledgeBase, id: RuleId) -> PonensResult<String> {
    let rule = kb
        .rule(id)?
        .ok_or(PonensError::Execution(ExecutionError::RuleNotFound { id }))?;
    Ok(format!(
        "{} => {}",
        render_expression(kb, rule.antecedent)?,
        render_expression(kb, rule.consequent)?
    ))
}

fn write_expression(
    kb: &dyn KnowledgeBase,
    id: ExpressionId,
    depth: usize,
    max_depth: usize,
    out: &mut String,
) -> PonensResult<()> {
    if depth > max_depth {
        return Err(ExecutionError::ExpressionTooDeep { max_depth }.into());
    }
    let node = kb
        .expression(id)?
        .ok_or(PonensError::Execution(ExecutionError::ExpressionNotFound { id }))?;
    node.validate()?;

    out.push('(');
    match node.operator {
        Operator::Identity => {
            if let Some(pid) = node.predicate {
                let predicate = kb
                    .predicate(pid)?
                    .ok_or(PonensError::Execution(ExecutionError::PredicateNotFound { id: pid }))?;
                out.push_str(&predicate.label);
            }
        }
        Operator::And | Operator::Or | Operator::Not => {
            out.push_str(node.operator.keyword());
            for child in &node.children {
                out.push(' ');
                write_expression(kb, *child, depth + 1, max_depth, out)?;
            }
        }
    }
    out.push(')');
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryKnowledgeBase;

    #[test]
    fn renders_nested_expressions() {
        let kb = InMemoryKnowledgeBase::new();
        let a = kb.add_predicate("a", "a").unwrap();
        let b = kb.add_predicate("b", "b").unwrap();
        let c = kb.add_predicate("c", "c").unwrap();
        let a_exp = kb.identity(a).unwrap();
        let b_exp = kb.identity(b).unwrap();
        let c_exp = kb.identity(c).unwrap();
        let either = kb.or(vec![b_exp, c_exp]).unwrap();
        let not_either = kb.not(either).unwrap();
        let top = kb.and(vec![a_exp, not_either]).unwrap();

        assert_eq!(render_expression(&kb, a_exp).unwrap(), "(a)");
        assert_eq!(
            render_expression(&kb, top).unwrap(),
            "(AND (a) (NOT (OR (b) (c))))"
        );
    }

    #[test]
    fn missing_rule_is_an_error() {
        let kb = InMemoryKnowledgeBase::new();
        let err = render_rule(&kb, RuleId::new()).unwrap_err();
        assert!(matches!(
            err,
            PonensError::Execution(ExecutionError::RuleNotFound { .. })
        ));
    }
}
