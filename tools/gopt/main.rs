//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use garnet::cli;
use garnet::cli::{passes, verify, BaseOptions};
use garnet::reader::format_parse_error;
use garnet::transforms::verify_graph;
use log::info;
use std::io::ErrorKind;
use std::{fs, io};

fn main() -> io::Result<()> {
    let (base, verify, passes) = parse_options();

    cli::init_logging(base.verbose);

    if base.inputs.len() != 1 {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "can only optimize one file at a time",
        ));
    }

    let input = &base.inputs[0];
    let source = fs::read_to_string(input)?;
    let name = input.display().to_string();

    if let Err(()) = optimize_single_file(&name, &source, &base, verify, &passes) {
        return Err(io::Error::new(
            ErrorKind::InvalidInput,
            "failed to optimize file",
        ));
    }

    Ok(())
}

fn parse_options() -> (BaseOptions, bool, Vec<String>) {
    let ((passes, verify), base) = cli::tool_with(
        "garnet .gir -> .gir optimizer",
        "Usage: gopt [options] <input graph>",
        bpaf::construct!(passes(), verify()),
    )
    .run();

    (base, verify, passes)
}

fn optimize_single_file(
    name: &str,
    source: &str,
    base: &BaseOptions,
    verify: bool,
    passes: &[String],
) -> Result<(), ()> {
    let mut graph = match garnet::parse_gir(source) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("{}", format_parse_error(name, source, &e));

            return Err(());
        }
    };

    // report a broken input nicely instead of letting the verify pass panic
    if verify {
        if let Err(errors) = verify_graph(&graph) {
            for error in errors {
                eprintln!("error: {error}");
            }

            return Err(());
        }
    }

    let changed = garnet::run_passes(&mut graph, verify, passes, &[]);

    info!("{name}: {} passes run, graph changed: {changed}", passes.len());

    match &base.output {
        Some(path) => {
            let text = garnet::analysis::stringify_graph(&graph);

            if let Err(e) = fs::write(path, text) {
                eprintln!("unable to write output to file `{}`: {e}", path.display());

                return Err(());
            }
        }
        None => garnet::analysis::print_graph(&graph),
    }

    Ok(())
}
