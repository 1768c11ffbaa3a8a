//! fin - Filter, group and sum tagged transactions.

fn main() -> std::process::ExitCode {
    finanse::cmd::query::main()
}
