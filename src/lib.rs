mod executor;
pub mod fsm;
pub mod harness;
mod junit;
mod obj;
pub mod prelude;
pub mod report;
pub mod sequencer;
pub mod sim;
pub mod sim_if;
mod signal;
mod test;
pub mod testbench;
mod trigger;
pub mod utils;
mod value;
pub mod verifier;

use executor::Task;
use futures::future::BoxFuture;
use lazy_static::lazy_static;
use obj::TbObjSafe;
use once_cell::sync::OnceCell;
use prettytable::{cell, row, Table};
use num_format::{Locale, ToFormattedString};
use signal::SimObject;
use sim_if::SIM_IF;
use std::sync::Arc;
use std::time;
use value::Val;

pub type SimpleResult<T> = Result<T, ()>;
pub type TbResult = Result<Val, Val>;
pub type TestFn = fn(SimObject) -> BoxFuture<'static, TbResult>;

pub static CRATE_NAME: OnceCell<String> = OnceCell::new();

lazy_static! {
    static ref SIM_START_TIME: TbObjSafe<Option<time::Instant>> = TbObjSafe::new(None);
}
lazy_static! {
    static ref CURRENT_TEST: TbObjSafe<Option<(Arc<Task>, TbObjSafe<test::Test>)>> =
        TbObjSafe::new(None);
}

pub fn pass_test(msg: &str) {
    // Passes test that has not already failed/passed
    if let Some((task, test)) = CURRENT_TEST.with_mut(|mut c| c.take()) {
        test.with_mut(|mut t| t.set_result(Ok(Val::String(msg.to_string()))));
        tear_down_test(task);
    }
}

pub fn fail_test(msg: &str) {
    // Fails test that has not already failed/passed
    if let Some((task, test)) = CURRENT_TEST.with_mut(|mut c| c.take()) {
        test.with_mut(|mut t| t.set_result(Err(Val::String(msg.to_string()))));
        tear_down_test(task);
    }
}

fn tear_down_test(test: Arc<Task>) {
    trigger::cancel_all_triggers();
    executor::clear_ready_queue();
    test.cancel();
}

/// Install the design, run every registered test to completion and report.
/// `Ok(())` only if all tests passed; any failed or unfinished test is the
/// aggregate failure.
pub fn run_all(design: Box<dyn sim::Design>, tests: test::TbTests) -> SimpleResult<()> {
    eprintln!("DBG run_all: ENTER");
    let _ = CRATE_NAME.set("player_fsm_tb".to_string());
    CURRENT_TEST.with_mut(|mut c| {
        c.take();
    });
    SIM_START_TIME.with_mut(|mut s| {
        s.replace(time::Instant::now());
    });
    eprintln!("DBG run_all: before setup");
    sim::setup(design);
    eprintln!("DBG run_all: before set_tests");
    test::set_tests(tests);
    eprintln!("DBG run_all: before start_of_simulation");
    start_of_simulation();
    eprintln!("DBG run_all: before run_sim");
    sim::run_sim();
    eprintln!("DBG run_all: before end_of_simulation");
    end_of_simulation()
}

fn start_of_simulation() {
    let sim_root = signal::SimObject::get_root().unwrap();

    // All tests are scheduled in a chain at simulation start up by awaiting the
    // previous test completion. Wrapping logic handles test results and timers.
    let mut join_handle: Option<executor::JoinHandle> = None;
    for test in test::test_list() {
        let prev = join_handle.take();
        join_handle = Some(Task::spawn_from_future(
            async move {
                // await previous test, if there is one
                if let Some(handle) = prev {
                    let _ = handle.await;
                }
                // spawn next test
                let test_for_wrapper = test.clone();
                let test_handle = Task::spawn_from_future(
                    async move {
                        let time_start = time::Instant::now();
                        let sim_time_start = SIM_IF.get_sim_time("ns");
                        let generator = test_for_wrapper.get().generator;
                        // await test execution
                        let result = (generator)(sim_root).await;

                        test_for_wrapper.with_mut(|mut test| {
                            test.time_secs = time_start.elapsed().as_secs_f64();
                            test.sim_time_ns = SIM_IF.get_sim_time("ns") - sim_time_start;
                        });
                        match result {
                            Ok(val) => pass_test(&format!("{:?}", val)),
                            Err(val) => fail_test(&format!("{:?}", val)),
                        }
                        Ok(Val::None)
                    },
                    "test",
                );
                // set current test handle
                let test_task = test_handle.get_task().unwrap().clone();
                CURRENT_TEST.with_mut(move |mut c| {
                    let _ = c.replace((test_task, test.clone()));
                });
                // await test execution
                let _ = test_handle.await;
                Ok(Val::None)
            },
            "chain",
        ));
    }

    // execute first simulation tick
    executor::run_once();
}

fn end_of_simulation() -> SimpleResult<()> {
    let duration = SIM_START_TIME
        .with_mut(|s| s.map(|t| t.elapsed().as_secs_f64()))
        .unwrap_or(0.0);
    let final_sim_time = SIM_IF.get_sim_time("ns");
    let sim_speed = final_sim_time / duration;

    let mut all_passed = true;
    let mut table = Table::new();
    table.add_row(row!["test", "result", "time [s]", "sim time [ns]"]);
    for test in test::test_list() {
        let (name, result_str, time, sim_time) = test.with_mut(|t| {
            let result_str = match t.result.as_ref() {
                Some(Ok(_)) => "passed",
                Some(Err(_)) => "failed",
                // result defaults to failed: the test never completed
                None => "failed (incomplete)",
            };
            (t.name.clone(), result_str, t.time_secs, t.sim_time_ns)
        });
        if result_str != "passed" {
            all_passed = false;
        }
        table.add_row(row![
            name,
            result_str,
            format!("{:.3}", time),
            (sim_time as u64).to_formatted_string(&Locale::en)
        ]);
    }
    eprintln!("DBG eos: before trivial table");
    {
        let mut t2 = Table::new();
        t2.add_row(row!["a", "b"]);
        t2.add_row(row!["1", "2"]);
        let _ = t2.print(&mut std::io::stdout());
    }
    eprintln!("DBG eos: after trivial table, before real printstd");
    let _ = table.print(&mut std::io::stdout());
    eprintln!("DBG eos: after printstd");

    SIM_IF.log(&format!(
        "Simulation time: {} ns",
        (final_sim_time as u64).to_formatted_string(&Locale::en)
    ));
    SIM_IF.log(&format!("Real time: {:.3} s", duration));
    SIM_IF.log(&format!("Simulation speed: {:.3} ns/s", sim_speed));

    junit::create_junit_xml();

    match all_passed {
        true => Ok(()),
        false => Err(()),
    }
}

#[inline]
#[cold]
pub(crate) fn cold() {}

#[cfg(test)]
mod dbg_table_tests {
    use super::*;
    #[test]
    fn trivial_table_print() {
        let mut t = Table::new();
        t.add_row(row!["a", "b"]);
        t.add_row(row!["1", "2"]);
        let _ = t.print(&mut std::io::stdout());
        eprintln!("DBG trivial_table_print done");
    }
}

/// Builds a `main` that runs the given tests against a design instance.
#[macro_export]
macro_rules! run_with_sim {
    ($design:expr, $( $i:ident ),+) => {
        fn main() {
            use $crate::prelude::*;
            let _ = $crate::CRATE_NAME.set(std::module_path!().to_string());
            // add tests to execution vector
            let mut tests = TbTests::new();
            $(tests.push(Test::new(stringify!($i).to_string(), |sim_root| { $i(sim_root).boxed() }));)+

            if $crate::run_all(Box::new($design), tests).is_err() {
                std::process::exit(1);
            }
        }
    }
}
