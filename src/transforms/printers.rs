//======---------------------------------------------------------------======//
//                                                                           //
// Copyright 2022-2023 Evan Cox <evanacox00@gmail.com>. All rights reserved. //
//                                                                           //
// Use of this source code is governed by a BSD-style license that can be    //
// found in the LICENSE.txt file at the root of this project, or at the      //
// following link: https://opensource.org/licenses/BSD-3-Clause              //
//                                                                           //
//======---------------------------------------------------------------======//

use crate::analysis::GraphWriter;
use crate::ir::Graph;
use crate::pass::GraphTransformPass;
use std::io;

/// This is a pass that writes out a textual representation of a graph
/// to a given stream.
pub struct GraphWriterPass {
    out: Box<dyn io::Write>,
}

impl GraphWriterPass {
    /// Shorthand for a writer that prints to [`std::io::stdout`].
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    /// Shorthand for a writer that prints to [`std::io::stderr`].
    pub fn stderr() -> Self {
        Self::with_writer(io::stderr())
    }

    /// Creates an instance of the pass with a given writer.
    ///
    /// This writer will be where the graph is printed out every time
    /// the pass is run.
    pub fn with_writer<T: io::Write + 'static>(writer: T) -> Self {
        Self {
            out: Box::new(writer),
        }
    }
}

impl GraphTransformPass for GraphWriterPass {
    fn run(&mut self, graph: &mut Graph) -> bool {
        let writer = GraphWriter::from(graph);

        self.out
            .write_all(writer.graph().as_bytes())
            .expect("unable to write graph to writer");

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_gir;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl io::Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);

            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_graph_text() {
        let source = "graph(%x: tensor) {
  %z = autograd_zero
  %y = autograd_add %x, %z
  return %y
}
";
        let mut graph = parse_gir(source).unwrap();
        let buffer = Shared::default();
        let mut pass = GraphWriterPass::with_writer(buffer.clone());

        assert!(!pass.run(&mut graph));
        assert_eq!(String::from_utf8(buffer.0.take()).unwrap(), source);
    }
}
