//! The pretty-printer's output must be a fixed point: print(parse(print(x)))
//! equals print(x), with no new errors on the re-parse.

mod common;

use common::assert_fixed_point;
use rstest::rstest;

#[rstest]
#[case("module a.b;\nint x = 3;")]
#[case("int x, y = 3;")]
#[case("const(int)* p;")]
#[case("int[] dyn;\nint[4] fixed;\nint[string] table;")]
#[case("int function(int) fp;\nint delegate() dg;")]
#[case("@safe @nogc void f(int x = 1, ...) { }")]
#[case("void f(in int a, out int b, ref int c, lazy int d) { }")]
#[case("struct S(T) if (is(T == int)) { T x; }")]
#[case("class C : Base, I {\n    int field;\n}")]
#[case("interface I { void m(); }")]
#[case("union U { int a; float b; }")]
#[case("enum Color { Red, Green = 2, Blue }")]
#[case("enum size = 16;")]
#[case("template Pair(A, B) { alias First = A; }")]
#[case("mixin template M() { int x; }\nmixin M!() m;")]
#[case("mixin(\"int generated;\");")]
#[case("import std.stdio;\nimport io = std.stdio;\nimport std.algorithm : map, f = filter;")]
#[case("static import core.memory;")]
#[case("alias Int = int;\nalias Fn = int function(int);")]
#[case("struct W { int v; alias v this; }")]
#[case("extern (C) void cfn();")]
#[case("extern (C++) struct Cpp { }")]
#[case("private:\nint hidden;")]
#[case("package(a.b) int scoped_;")]
#[case("align(4) struct Packed { }")]
#[case("pragma(lib, \"m\");")]
#[case("deprecated(\"use other\") int old_;")]
#[case("version = Custom;\nversion (Custom) {\n    int a;\n} else {\n    int b;\n}")]
#[case("debug {\n    int traced;\n}")]
#[case("static if (true) {\n    int a;\n}")]
#[case("static foreach (i; 0 .. 3) {\n    int x;\n}")]
#[case("static assert(true, \"msg\");")]
#[case("static this() { }\nshared static ~this() { }")]
#[case("struct L { this(int v) { } this(this) { } ~this() { } invariant (v > 0); }")]
#[case("unittest {\n    assert(1 == 1);\n}")]
#[case("auto x = 1, y = 2;")]
#[case("auto f() { return 1; }")]
#[case("T identity(T)(T value) { return value; }")]
#[case("int f(int x)\nin (x > 0)\nout (r; r > 0)\n{\n    return x;\n}")]
#[case("int g(int x)\nin { assert(x); }\ndo {\n    return x;\n}")]
#[case("int h(int x) in (x > 0);")]
fn declarations_round_trip(#[case] source: &str) {
    assert_fixed_point(source);
}

#[rstest]
#[case("void t() { while (a) b(); }")]
#[case("void t() { do c(); while (d); }")]
#[case("void t() { for (int i = 0; i < 10; i++) e(i); }")]
#[case("void t() { for (;;) { break; } }")]
#[case("void t() { foreach (x; items) use(x); }")]
#[case("void t() { foreach (i, ref v; arr) use(v); }")]
#[case("void t() { foreach_reverse (i; 0 .. 10) use(i); }")]
#[case("void t() { if (auto p = f()) g(p); else h(); }")]
#[case("void t() { if (int v = next()) use(v); }")]
#[case("void t(int x) { switch (x) { case 1, 2: a(); break; case 3: .. case 9: b(); break; default: c(); } }")]
#[case("void t(int x) { final switch (x) { default: c(); } }")]
#[case("void t() { L: x(); goto L; }")]
#[case("void t() { scope(exit) done(); }")]
#[case("void t() { try { risky(); } catch (Exception e) { handle(e); } finally { done(); } }")]
#[case("void t() { throw new Exception(\"x\"); }")]
#[case("void t() { synchronized (lock) { b(); } }")]
#[case("void t() { with (obj) { c(); } }")]
#[case("void t() { asm { mov EAX, 1; ret; } }")]
#[case("void t() { static foreach (i; 0 .. 3) { use(i); } }")]
#[case("void t() { static if (cond) { a(); } else { b(); } }")]
#[case("void t() { version (X) { c(); } }")]
#[case("void t() { mixin(\"int x;\"); }")]
#[case("void t() { pragma(msg, \"hi\"); }")]
#[case("void t() { static assert(true); }")]
fn statements_round_trip(#[case] source: &str) {
    assert_fixed_point(source);
}

#[rstest]
#[case("int x = a + b * c;")]
#[case("int x = (a + b) * c;")]
#[case("bool b = a < c || d >= e;")]
#[case("int p = 2 ^^ 3 ^^ 4;")]
#[case("int n = -a ^^ b;")]
#[case("auto r = t ? a : b;")]
#[case("auto s = \"text\"w;")]
#[case("auto c = 'x';")]
#[case("auto f1 = 1.5f;")]
#[case("auto aa = [\"a\": 1, \"b\": 2];")]
#[case("auto arr = [1, 2, 3];")]
#[case("auto sl = a[1 .. 2];")]
#[case("auto ix = a[1, 2 .. 3];")]
#[case("auto lam = (x) => x + 1;")]
#[case("auto lam2 = delegate int(int a) { return a; };")]
#[case("auto dg = function () { };")]
#[case("auto n = new Foo(1, 2);")]
#[case("auto m = obj.field.method(1)[2];")]
#[case("auto q = cast(const) x;")]
#[case("auto w = cast(int) x;")]
#[case("bool is1 = is(T == struct);")]
#[case("bool is2 = is(T U : U*, U);")]
#[case("auto ti = typeid(int);")]
#[case("auto tr = __traits(compiles, 1 + 1);")]
#[case("auto ln = __LINE__;")]
#[case("int big = int.max;")]
#[case("auto g = .globalName;")]
#[case("auto inst = Templ!(int, 3);")]
#[case("auto one = Templ!int;")]
fn expressions_round_trip(#[case] source: &str) {
    assert_fixed_point(source);
}
