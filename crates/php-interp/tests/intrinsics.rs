use php_interp::{Ini, Interpreter, Request};

fn run(source: &str) -> String {
    let mut interp = Interpreter::new(Ini::dev(), Request::default(), "test.php");
    let (output, err) = interp.process(source.as_bytes());
    assert!(err.is_none(), "unexpected error: {:?}", err);
    String::from_utf8_lossy(&output).into_owned()
}

#[test]
fn isset_requires_all_set_and_non_null() {
    assert_eq!(run("<?php $a=1; $b=2; var_dump(isset($a, $b));"), "bool(true)\n");
    assert_eq!(run("<?php $a=1; var_dump(isset($a, $missing));"), "bool(false)\n");
    assert_eq!(run("<?php $a=null; var_dump(isset($a));"), "bool(false)\n");
    // No undefined-variable warning leaks out of isset.
    assert_eq!(run("<?php var_dump(isset($nope));"), "bool(false)\n");
}

#[test]
fn isset_on_array_elements() {
    assert_eq!(
        run("<?php $a=[1,2]; var_dump(isset($a[0]), isset($a[9]));"),
        "bool(true)\nbool(false)\n"
    );
}

#[test]
fn empty_matches_falsy_or_undefined() {
    assert_eq!(run("<?php var_dump(empty($nope));"), "bool(true)\n");
    assert_eq!(run("<?php $a=0; var_dump(empty($a));"), "bool(true)\n");
    assert_eq!(run("<?php $a=\"0\"; var_dump(empty($a));"), "bool(true)\n");
    assert_eq!(run("<?php $a=[]; var_dump(empty($a));"), "bool(true)\n");
    assert_eq!(run("<?php $a=\"x\"; var_dump(empty($a));"), "bool(false)\n");
}

#[test]
fn unset_variables_and_elements() {
    assert_eq!(run("<?php $a=1; unset($a); var_dump(isset($a));"), "bool(false)\n");
    assert_eq!(
        run("<?php $a=[1,2]; unset($a[0]); var_dump(isset($a[0]), $a[1]);"),
        "bool(false)\nint(2)\n"
    );
    // Unsetting something that does not exist is a no-op.
    assert_eq!(run("<?php unset($ghost, $a[0]); echo \"ok\";"), "ok");
}

#[test]
fn unset_nested_element() {
    assert_eq!(
        run("<?php $a=['x'=>['y'=>1,'z'=>2]]; unset($a['x']['y']); var_dump($a);"),
        "array(1) {\n  [\"x\"]=>\n  array(1) {\n    [\"z\"]=>\n    int(2)\n  }\n}\n"
    );
}

#[test]
fn eval_returns_and_shares_scope() {
    assert_eq!(run("<?php $r = eval('return 2+3;'); echo $r;"), "5");
    assert_eq!(run("<?php eval('$x = 4;'); echo $x;"), "4");
    assert_eq!(run("<?php $y=10; echo eval('return $y * 2;');"), "20");
    // Without a return, eval yields null.
    assert_eq!(run("<?php var_dump(eval('1;'));"), "NULL\n");
}

#[test]
fn eval_can_define_functions() {
    assert_eq!(run("<?php eval('function made(){ return 8; }'); echo made();"), "8");
}

#[test]
fn variable_variables() {
    assert_eq!(run("<?php $name=\"x\"; $$name = 7; echo $x;"), "7");
    assert_eq!(run("<?php ${'a'.'b'} = 3; echo $ab;"), "3");
    assert_eq!(run("<?php $a=\"b\"; $b=\"c\"; $c=9; echo $$$a;"), "9");
}

#[test]
fn error_control_silences_diagnostics() {
    assert_eq!(run("<?php echo @$undef; echo \"ok\";"), "ok");
    assert_eq!(run("<?php $a=[]; echo @$a[\"k\"]; echo \"ok\";"), "ok");
}

#[test]
fn coalesce_takes_isset_path() {
    assert_eq!(run("<?php echo $undef ?? \"d\";"), "d");
    assert_eq!(run("<?php $a=null; echo $a ?? \"n\";"), "n");
    assert_eq!(run("<?php $b=0; echo $b ?? \"x\";"), "0");
    assert_eq!(run("<?php $a=[]; echo $a[\"k\"] ?? \"missing\";"), "missing");
    // Chains associate to the right.
    assert_eq!(run("<?php echo $u1 ?? $u2 ?? \"last\";"), "last");
}

#[test]
fn coalesce_short_circuits_the_right_side() {
    assert_eq!(
        run("<?php function f(){ echo \"side\"; return 1; } $a=5; echo $a ?? f();"),
        "5"
    );
}

#[test]
fn print_yields_one() {
    assert_eq!(run("<?php $r = print \"hi\"; echo $r;"), "hi1");
    assert_eq!(run("<?php print 42;"), "42");
}

#[test]
fn casts() {
    assert_eq!(run("<?php var_dump((int)\"7golf\");"), "int(7)\n");
    assert_eq!(run("<?php var_dump((float)\"1.5\");"), "float(1.5)\n");
    assert_eq!(run("<?php var_dump((bool)\"0\");"), "bool(false)\n");
    assert_eq!(run("<?php var_dump((string)42);"), "string(2) \"42\"\n");
    assert_eq!(run("<?php var_dump((int)12.9);"), "int(12)\n");
}

#[test]
fn cast_idempotence() {
    assert_eq!(run("<?php var_dump((int)(int)\"5x\");"), "int(5)\n");
    assert_eq!(run("<?php var_dump((bool)(bool)\"\");"), "bool(false)\n");
    assert_eq!(run("<?php var_dump((string)(string)5);"), "string(1) \"5\"\n");
}

#[test]
fn inc_dec_value_transitions() {
    assert_eq!(run("<?php $a=null; $a++; var_dump($a);"), "int(1)\n");
    assert_eq!(run("<?php $a=null; $a--; var_dump($a);"), "NULL\n");
    assert_eq!(run("<?php $a=true; $a++; var_dump($a);"), "bool(true)\n");
    assert_eq!(run("<?php $a=1.5; $a++; var_dump($a);"), "float(2.5)\n");
}

#[test]
fn prefix_returns_new_postfix_returns_old() {
    assert_eq!(run("<?php $i=5; echo ++$i; echo $i;"), "66");
    assert_eq!(run("<?php $i=5; echo $i++; echo $i;"), "56");
    assert_eq!(run("<?php $i=5; echo --$i, $i--, $i;"), "443");
}

#[test]
fn inc_dec_on_array_elements() {
    assert_eq!(run("<?php $a=[5]; $a[0]++; echo $a[0];"), "6");
}

#[test]
fn compound_assignment_operators() {
    assert_eq!(run("<?php $a=10; $a += 5; $a -= 3; $a *= 2; echo $a;"), "24");
    assert_eq!(run("<?php $s=\"a\"; $s .= \"b\"; echo $s;"), "ab");
    assert_eq!(run("<?php $a=8; $a >>= 2; $a <<= 1; echo $a;"), "4");
    assert_eq!(run("<?php $a=6; $a &= 3; echo $a;"), "2");
    assert_eq!(run("<?php $a=[1]; $a[0] += 9; echo $a[0];"), "10");
}
