use fond_model::{Condition, Effect, NondetAction, NondetId, OpId, Operator, PartialState, Task, Variable};

use crate::error::TaskError;
use crate::lexer::Lexer;
use crate::nondet::group_operators;

/// Parses a finite-domain task description in the line-oriented, magic-token-delimited format
/// produced by a Fast-Downward-style translator (spec.md §6, §9.5): version/metric header,
/// variable declarations, mutex groups, initial state, goal, operators, and axiom rules.
///
/// Grounded on `global_operator.cc`'s `read_pre_post` and the corresponding `globals.cc` section
/// readers referenced by SPEC_FULL.md §9.5. Axiom rules (`begin_rule`/`end_rule`) are parsed only
/// far enough to report their count: a task containing any is rejected (SPEC_FULL.md §9.5's
/// recorded Open-Question decision — see DESIGN.md).
pub fn parse_task(input: &str) -> Result<Task, TaskError> {
    let mut lex = Lexer::new(input);

    lex.expect("begin_version")?;
    let _version: u32 = lex.next_int("version number")?;
    lex.expect("end_version")?;

    lex.expect("begin_metric")?;
    let uses_action_costs: u32 = lex.next_int("metric flag")?;
    lex.expect("end_metric")?;

    let num_vars: usize = lex.next_int("variable count")?;
    let mut variables = Vec::with_capacity(num_vars);
    for _ in 0..num_vars {
        lex.expect("begin_variable")?;
        let name = lex.next_line("variable name")?.to_string();
        let _axiom_layer: i32 = lex.next_int("axiom layer")?;
        let domain_size: u32 = lex.next_int("domain size")?;
        let mut fact_names = Vec::with_capacity(domain_size as usize);
        for _ in 0..domain_size {
            fact_names.push(lex.next_line("fact name")?.to_string());
        }
        lex.expect("end_variable")?;
        variables.push(Variable { name, domain_size, fact_names });
    }

    let num_mutex_groups: usize = lex.next_int("mutex group count")?;
    for _ in 0..num_mutex_groups {
        lex.expect("begin_mutex_group")?;
        let n: usize = lex.next_int("mutex group size")?;
        for _ in 0..n {
            let _ = lex.next_int_pair("mutex group literal")?;
        }
        lex.expect("end_mutex_group")?;
    }

    lex.expect("begin_state")?;
    let mut initial = PartialState::new_unset(num_vars);
    for var in 0..num_vars {
        let val: i32 = lex.next_int("initial state value")?;
        check_value(&variables, var, val, lex.line_no())?;
        initial.set(var, val);
    }
    lex.expect("end_state")?;

    lex.expect("begin_goal")?;
    let num_goal: usize = lex.next_int("goal literal count")?;
    let mut goal = PartialState::new_unset(num_vars);
    for _ in 0..num_goal {
        let (var, val) = lex.next_int_pair("goal literal")?;
        let (var, val) = (var as usize, val as i32);
        check_var(&variables, var, lex.line_no())?;
        check_value(&variables, var, val, lex.line_no())?;
        goal.set(var, val);
    }
    lex.expect("end_goal")?;

    let num_operators: usize = lex.next_int("operator count")?;
    let mut names = Vec::with_capacity(num_operators);
    let mut operators = Vec::with_capacity(num_operators);
    for _ in 0..num_operators {
        let (name, preconditions, effects, declared_cost) = parse_operator(&mut lex, &variables)?;
        names.push(name.clone());
        let cost = if uses_action_costs != 0 { declared_cost.max(1) } else { 1 };
        operators.push(RawOp { name, preconditions, effects, cost });
    }

    let num_axiom_rules: usize = lex.next_int("axiom rule count")?;
    if num_axiom_rules > 0 {
        return Err(TaskError::AxiomsUnsupported { count: num_axiom_rules });
    }

    let groups = group_operators(&names);
    let mut nondet_actions = Vec::with_capacity(groups.len());
    let mut final_ops: Vec<Option<Operator>> = (0..operators.len()).map(|_| None).collect();
    for (group_idx, group) in groups.iter().enumerate() {
        let nondet_id = NondetId::from_u32(group_idx as u32);
        let mut outcomes = vec![OpId::from_u32(0); group.members.len()];
        for &(op_idx, outcome_index) in &group.members {
            let raw = &operators[op_idx];
            outcomes[outcome_index as usize] = OpId::from_u32(op_idx as u32);
            final_ops[op_idx] = Some(Operator {
                name: raw.name.clone(),
                preconditions: raw.preconditions.clone(),
                effects: raw.effects.clone(),
                cost: raw.cost,
                nondet_id,
                outcome_index,
            });
        }
        nondet_actions.push(NondetAction { name: group.name.clone(), outcomes });
    }
    let operators: Vec<Operator> = final_ops.into_iter().map(|o| o.expect("every operator belongs to exactly one group")).collect();

    tracing::debug!(
        num_vars,
        num_operators = operators.len(),
        num_nondet_actions = nondet_actions.len(),
        "parsed FOND task"
    );

    Ok(Task::new(variables, operators, nondet_actions, initial, goal))
}

struct RawOp {
    name: String,
    preconditions: Vec<Condition>,
    effects: Vec<Effect>,
    cost: u32,
}

#[allow(clippy::type_complexity)]
fn parse_operator(lex: &mut Lexer, variables: &[Variable]) -> Result<(String, Vec<Condition>, Vec<Effect>, u32), TaskError> {
    lex.expect("begin_operator")?;
    let name = lex.next_line("operator name")?.to_string();

    let num_prevail: usize = lex.next_int("prevail condition count")?;
    let mut preconditions = Vec::with_capacity(num_prevail);
    for _ in 0..num_prevail {
        let (var, val) = lex.next_int_pair("prevail condition")?;
        let (var, val) = (var as u32, val as i32);
        check_var(variables, var as usize, lex.line_no())?;
        check_value(variables, var as usize, val, lex.line_no())?;
        preconditions.push(Condition { var, val });
    }

    let num_pre_post: usize = lex.next_int("effect count")?;
    let mut effects = Vec::with_capacity(num_pre_post);
    for _ in 0..num_pre_post {
        let line = lex.next_line("pre_post effect")?;
        let mut tokens = line.split_whitespace();
        let num_cond: usize = tokens
            .next()
            .ok_or_else(|| TaskError::ExpectedInt { line: lex.line_no(), found: line.to_string() })?
            .parse()
            .map_err(|_| TaskError::ExpectedInt { line: lex.line_no(), found: line.to_string() })?;

        let mut condition = Vec::with_capacity(num_cond);
        for _ in 0..num_cond {
            let var: i64 = next_token(&mut tokens, lex.line_no())?;
            let val: i64 = next_token(&mut tokens, lex.line_no())?;
            let (var, val) = (var as u32, val as i32);
            check_var(variables, var as usize, lex.line_no())?;
            check_value(variables, var as usize, val, lex.line_no())?;
            condition.push(Condition { var, val });
        }

        let var: i64 = next_token(&mut tokens, lex.line_no())?;
        let pre: i64 = next_token(&mut tokens, lex.line_no())?;
        let post: i64 = next_token(&mut tokens, lex.line_no())?;
        let var = var as u32;
        check_var(variables, var as usize, lex.line_no())?;
        if pre >= 0 {
            check_value(variables, var as usize, pre as i32, lex.line_no())?;
            preconditions.push(Condition { var, val: pre as i32 });
        }
        check_value(variables, var as usize, post as i32, lex.line_no())?;
        effects.push(Effect { var, val: post as i32, condition });
    }

    let cost: u32 = lex.next_int("operator cost")?;
    lex.expect("end_operator")?;

    Ok((name, preconditions, effects, cost))
}

fn next_token<T: std::str::FromStr>(tokens: &mut std::str::SplitWhitespace, line_no: usize) -> Result<T, TaskError> {
    let tok = tokens.next().ok_or(TaskError::UnexpectedEof { expected: "pre_post field" })?;
    tok.parse().map_err(|_| TaskError::ExpectedInt { line: line_no, found: tok.to_string() })
}

fn check_var(variables: &[Variable], var: usize, line: usize) -> Result<(), TaskError> {
    if var >= variables.len() {
        return Err(TaskError::UnknownVariable { line, var, num_vars: variables.len() });
    }
    Ok(())
}

fn check_value(variables: &[Variable], var: usize, val: i32, line: usize) -> Result<(), TaskError> {
    check_var(variables, var, line)?;
    let domain_size = variables[var].domain_size;
    if val < 0 || val as u32 >= domain_size {
        return Err(TaskError::UnknownValue { line, var, val, domain_size });
    }
    Ok(())
}
