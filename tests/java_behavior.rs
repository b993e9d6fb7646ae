//! Java control- and data-flow: exception structure, labeled jumps,
//! enhanced for, switch groups and synchronized blocks.

mod common;

use codeweave::{Language, View, ViewConfig};
use common::*;

#[test]
fn try_catch_finally_routes_every_exit() {
    let source = "\
class A {
    int f(int x) {
        try {
            if (x > 0) { return 1; }
            g();
        } catch (RuntimeException e) {
            h();
        } finally {
            log();
        }
        return 0;
    }
    void g() {}
    void h() {}
    void log() {}
}
";
    let g = cfg_of(source, Language::Java);

    // A return inside try detours through finally, which carries the
    // return on to the exit.
    assert_edge(&g, "return 1;", "seq", "log();");
    assert_edge(&g, "log();", "return", "exit(f)");
    assert_no_edge(&g, "return 1;", "return", "exit(f)");

    // Normal completion and the handler also pass through finally.
    assert_edge(&g, "g();", "seq", "log();");
    assert_edge(&g, "h();", "seq", "log();");
    assert_edge(&g, "catch(RuntimeException e)", "catch", "h();");

    // After finally, control resumes behind the construct.
    assert_edge(&g, "log();", "seq", "return 0;");
    assert_edge(&g, "return 0;", "return", "exit(f)");
}

#[test]
fn throw_edges_to_the_enclosing_catch() {
    let source = "\
class A {
    void f(int x) {
        try {
            if (x < 0) { throw new IllegalStateException(); }
            work();
        } catch (RuntimeException e) {
            recover();
        }
        done();
    }
    void work() {}
    void recover() {}
    void done() {}
}
";
    let g = cfg_of(source, Language::Java);

    assert_edge(
        &g,
        "throw new IllegalStateException();",
        "throw",
        "catch(RuntimeException e)",
    );
    assert_edge(&g, "catch(RuntimeException e)", "catch", "recover();");
    assert_edge(&g, "recover();", "seq", "done();");
    assert_edge(&g, "work();", "seq", "done();");
}

#[test]
fn throw_without_catch_goes_to_exit() {
    let source = "\
class A {
    void f() {
        throw new IllegalStateException();
    }
}
";
    let g = cfg_of(source, Language::Java);
    assert_edge(&g, "throw new IllegalStateException();", "throw", "exit(f)");
}

#[test]
fn labeled_break_leaves_the_outer_loop() {
    let source = "\
class A {
    void f(int n) {
        outer: for (int i = 0; i < n; i++) {
            while (true) {
                break outer;
            }
        }
        done();
    }
    void done() {}
}
";
    let g = cfg_of(source, Language::Java);

    assert_edge(&g, "outer:", "seq", "int i = 0;");
    assert_edge(&g, "break outer;", "seq", "done();");
    assert_edge(&g, "while(true)", "loop_exit", "i++");
    assert_no_edge(&g, "break outer;", "seq", "i++");
}

#[test]
fn enhanced_for_binds_and_loops() {
    let source = "\
class A {
    int sum(int[] xs) {
        int s = 0;
        for (int x : xs) {
            s = s + x;
        }
        return s;
    }
}
";
    let g = cfg_of(source, Language::Java);
    assert_edge(&g, "for(int x : xs)", "true", "s = s + x;");
    assert_edge(&g, "s = s + x;", "loop_back", "for(int x : xs)");
    assert_edge(&g, "for(int x : xs)", "loop_exit", "return s;");

    // The element binding is a definition at the header.
    let d = run(
        source,
        Language::Java,
        &ViewConfig::with_views([View::Dfg]),
    );
    assert_edge(&d, "for(int x : xs)", "reaches", "s = s + x;");
    assert_eq!(
        sources_into(&d, "return s;", "reaches"),
        ["int s = 0;", "s = s + x;"]
    );
}

#[test]
fn switch_groups_fall_through_like_c() {
    let source = "\
class A {
    int pick(int x) {
        int r = 0;
        switch (x) {
            case 1: r = 1; break;
            case 2: r = 2;
            case 3: r = r + 10; break;
            default: r = -1;
        }
        return r;
    }
}
";
    let g = cfg_of(source, Language::Java);

    assert_edge(&g, "switch(x)", "case(1)", "r = 1;");
    assert_edge(&g, "switch(x)", "case(2)", "r = 2;");
    assert_edge(&g, "switch(x)", "case(3)", "r = r + 10;");
    assert_edge(&g, "switch(x)", "default", "r = -1;");
    assert_edge(&g, "r = 2;", "seq", "r = r + 10;");
    assert_no_edge(&g, "r = 1;", "seq", "r = 2;");
    assert_edge(&g, "r = -1;", "seq", "return r;");
}

#[test]
fn synchronized_wraps_its_body() {
    let source = "\
class A {
    void f(Object lock) {
        synchronized (lock) {
            work();
        }
        done();
    }
    void work() {}
    void done() {}
}
";
    let g = cfg_of(source, Language::Java);
    assert_edge(&g, "synchronized(lock)", "seq", "work();");
    assert_edge(&g, "work();", "seq", "done();");
}

#[test]
fn method_calls_link_within_the_file() {
    let source = "\
class A {
    int twice(int x) { return x + x; }
    int f() {
        return twice(21);
    }
}
";
    let g = cfg_of(source, Language::Java);
    assert_edge(&g, "return twice(21);", "call", "entry(twice)");
}

#[test]
fn constructor_calls_link_to_the_constructor() {
    let source = "\
class A {
    A() { init(); }
    void init() {}
    static A make() {
        return new A();
    }
}
";
    let g = cfg_of(source, Language::Java);
    assert_edge(&g, "return new A();", "call", "entry(A)");
}
