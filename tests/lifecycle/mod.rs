mod run_lifecycle;
mod trigger_lifecycle;
