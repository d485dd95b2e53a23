use errs::{e, trace, Kind, Trace, TraceMode};

fn main() {
    let root = e!(op("store/MovieStore.Find"), kind(Kind::NotExist), msg("no rows"));
    let mid = e!(op("movie/Service.Get"), wrap(root));
    let err = e!(op("http/Handler.GetMovie"), wrap(mid));

    println!("--- Trace Modes Example ---\n");
    println!("Set RUST_BACKTRACE=1 to populate captured stacks.\n");

    for mode in [TraceMode::OpStack, TraceMode::CapturedStack] {
        println!("mode = {mode}");
        match trace(mode, &err) {
            Trace::Ops(ops) => {
                for op in ops {
                    println!("   {op}");
                }
            }
            Trace::Captured(backtrace) => println!("{backtrace}"),
        }
        println!();
    }

    println!("innermost cause: {}", errs::top_error(&err));
}
