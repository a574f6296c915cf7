//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::discovery;
use crate::testcase::TestFailure;
use backtrace::Backtrace;
use std::any::Any;
use std::cell::RefCell;
use std::panic;
use std::sync::mpsc;
use std::sync::mpsc::Receiver;
use std::sync::Once;
use std::time::{Duration, Instant};
use threadpool::ThreadPool;

thread_local! {
    static BACKTRACE: RefCell<Option<Backtrace>> = RefCell::new(None);
}

static INSTALL_HOOK: Once = Once::new();

pub enum TestResult {
    Output(String),
    CompileError(String),
}

pub struct TestDetails {
    pub elapsed: Duration,
    pub output: Result<(), TestFailure>,
}

pub struct Subtest {
    subdir: &'static str,
    runner: fn(&str, &str) -> TestResult,
}

// the default hook would print over the test output, this one just
// stashes the backtrace so the failure can be reported with the file
fn install_panic_hook() {
    INSTALL_HOOK.call_once(|| {
        panic::set_hook(Box::new(|_| {
            BACKTRACE.with(|b| *b.borrow_mut() = Some(Backtrace::new()));
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "<unknown panic payload>".to_owned()
    }
}

impl Subtest {
    pub const fn new(subdir: &'static str, runner: fn(&str, &str) -> TestResult) -> Self {
        Self { subdir, runner }
    }

    pub fn subdir(&self) -> &'static str {
        self.subdir
    }

    pub fn run(&self, pool: &mut ThreadPool) -> Receiver<(&'static str, TestDetails)> {
        let (send, recv) = mpsc::channel();

        install_panic_hook();

        for (name, contents, case) in discovery::cases_in_subdir(self.subdir) {
            let send = send.clone();
            let runner = self.runner;
            let (name, contents) = (*name, *contents);

            pool.execute(move || {
                let start = Instant::now();
                let result = panic::catch_unwind(|| runner(name, contents));
                let elapsed = start.elapsed();
                let output = match result {
                    Ok(output) => case.check(output),
                    Err(payload) => {
                        let bt = BACKTRACE
                            .with(|b| b.borrow_mut().take())
                            .map(|b| format!("{b:?}"))
                            .unwrap_or_default();

                        Err(TestFailure::Panic(bt, panic_message(&*payload)))
                    }
                };

                send.send((name, TestDetails { elapsed, output }))
                    .expect("unable to send")
            });
        }

        recv
    }
}
