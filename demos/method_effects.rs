use std::rc::Rc;

use clap::{Parser, ValueEnum};

use dfa_rs::call::CallDescriptor;
use dfa_rs::factory::ValueFactory;
use dfa_rs::handlers::{standard_handlers, JAVA_LANG_MATH, JAVA_LANG_STRING};
use dfa_rs::range::RangeSet;
use dfa_rs::reference::ValueId;
use dfa_rs::state::MemoryState;
use dfa_rs::types::VarType;
use dfa_rs::value::RelationOp;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Scenario {
    All,
    IsEmpty,
    Equals,
    StartsWith,
    MinMax,
    Abs,
}

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Scenario to run.
    #[arg(value_enum, default_value = "all")]
    scenario: Scenario,

    /// Log level (off, error, warn, info, debug, trace).
    #[clap(long, value_name = "LEVEL", default_value = "info")]
    log_level: simplelog::LevelFilter,

    /// Number of hash buckets in the value factory (in bits).
    #[clap(long, value_name = "INT", default_value = "12")]
    bucket_bits: usize,
}

fn run(
    title: &str,
    call: CallDescriptor,
    qualifier: ValueId,
    args: &[ValueId],
    state: MemoryState,
    factory: &ValueFactory,
) -> color_eyre::Result<()> {
    println!("== {}", title);
    println!("call = {}", call);
    println!("before = {}", state);
    let Some(states) = standard_handlers().apply(&call, qualifier, args, state, factory) else {
        color_eyre::eyre::bail!("no handler registered for {}", call);
    };
    if states.is_empty() {
        println!("no successors (path pruned)");
    }
    for (i, s) in states.iter().enumerate() {
        println!("successor #{} = {}", i, s);
    }
    println!();
    Ok(())
}

/// Narrow the scenario state by `left op right`, failing if it is infeasible.
fn assume(
    state: &mut MemoryState,
    left: ValueId,
    op: RelationOp,
    right: ValueId,
) -> color_eyre::Result<()> {
    if !state.apply_relation(left, op, right) {
        let factory = state.factory();
        color_eyre::eyre::bail!(
            "scenario setup {} {} {} is infeasible",
            factory.display(left),
            op,
            factory.display(right)
        );
    }
    Ok(())
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Cli::parse();

    simplelog::TermLogger::init(
        args.log_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    println!("args = {:?}", args);

    let factory = Rc::new(ValueFactory::new(args.bucket_bits));
    let initial = MemoryState::new(factory.clone());
    let wants = |s: Scenario| args.scenario == Scenario::All || args.scenario == s;

    let s = factory.variable("s", VarType::String);
    let t = factory.variable("t", VarType::String);
    let x = factory.variable("x", VarType::Int);

    if wants(Scenario::IsEmpty) {
        let is_empty = CallDescriptor::instance(JAVA_LANG_STRING, "isEmpty", &[]);
        run("s.isEmpty()", is_empty.clone(), s, &[], initial.create_copy(), &factory)?;

        let mut state = initial.create_copy();
        assume(&mut state, factory.string_length(s), RelationOp::Eq, factory.int(5))?;
        run("s.isEmpty() where s.length = 5", is_empty, s, &[], state, &factory)?;
    }

    if wants(Scenario::Equals) {
        let equals = CallDescriptor::instance(JAVA_LANG_STRING, "equals", &["java.lang.Object"]);
        let abc = factory.string("abc");
        run("\"abc\".equals(\"abc\")", equals.clone(), abc, &[abc], initial.create_copy(), &factory)?;
        run("s.equals(\"abc\")", equals, s, &[abc], initial.create_copy(), &factory)?;
    }

    if wants(Scenario::StartsWith) {
        let starts_with = CallDescriptor::instance(JAVA_LANG_STRING, "startsWith", &[JAVA_LANG_STRING]);
        let mut state = initial.create_copy();
        assume(&mut state, factory.string_length(s), RelationOp::Le, factory.int(3))?;
        assume(&mut state, factory.string_length(t), RelationOp::Eq, factory.int(5))?;
        run("s.startsWith(t) where s.length <= 3, t.length = 5", starts_with, s, &[t], state, &factory)?;
    }

    if wants(Scenario::MinMax) {
        let a = factory.range(RangeSet::range(1, 5));
        let b = factory.range(RangeSet::range(3, 10));
        let max = CallDescriptor::static_call(JAVA_LANG_MATH, "max", &["int", "int"]);
        let min = CallDescriptor::static_call(JAVA_LANG_MATH, "min", &["int", "int"]);
        run("Math.max({1..5}, {3..10})", max, factory.unknown(), &[a, b], initial.create_copy(), &factory)?;
        run("Math.min({1..5}, {3..10})", min, factory.unknown(), &[a, b], initial.create_copy(), &factory)?;
    }

    if wants(Scenario::Abs) {
        let abs_int = CallDescriptor::static_call(JAVA_LANG_MATH, "abs", &["int"]);
        let abs_long = CallDescriptor::static_call(JAVA_LANG_MATH, "abs", &["long"]);
        run("Math.abs(x)", abs_int, factory.unknown(), &[x], initial.create_copy(), &factory)?;
        let negative = factory.range(RangeSet::range(i64::MIN, -1));
        run(
            "Math.abs({MIN..-1}L)",
            abs_long,
            factory.unknown(),
            &[negative],
            initial.create_copy(),
            &factory,
        )?;
    }

    println!("factory = {:?}", factory);

    Ok(())
}
