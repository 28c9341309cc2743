use super::*;

fn load(text: &str) -> (Module, Diagnostics) {
    let builder = CstBuilder::new();
    let mut diagnostics = Diagnostics::new();
    let module = load_module_from_string(&builder, text, None, &mut diagnostics).unwrap();
    (module, diagnostics)
}

fn inputs(bindings: &[(&str, &str)]) -> Env {
    bindings
        .iter()
        .map(|(name, literal)| (name.to_string(), literal::parse_literal(literal).unwrap()))
        .collect()
}

fn run(module: &Module, bindings: &[(&str, &str)]) -> Env {
    let mut diagnostics = Diagnostics::new();
    simulate(module, &inputs(bindings), &mut diagnostics).unwrap()
}

#[test]
fn adder_and_multiplier() {
    let (module, diagnostics) = load("
        module arith(
            input  [7:0] a, b,
            output [7:0] c,
            output [7:0] d
        );
            assign c = a + b;
            assign d = a * b;
        endmodule
    ");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(module.name, "arith");
    assert_eq!(module.outputs, vec!["c", "d"]);

    let env = run(&module, &[("a", "8'd3"), ("b", "8'd4")]);
    assert_eq!(env["c"], Value::from_u64(8, 7));
    assert_eq!(env["d"], Value::from_u64(8, 12));
    assert_eq!(env["c"].to_string(), "7w8");
}

#[test]
fn truncating_addition() {
    let (module, _diagnostics) = load("
        module m(input [7:0] a, output [7:0] y);
            assign y = a + 8'd1;
        endmodule
    ");
    let env = run(&module, &[("a", "8'd255")]);
    assert_eq!(env["y"], Value::from_u64(8, 0));
}

#[test]
fn concatenation_packing() {
    let (module, _diagnostics) = load("
        module m(output [7:0] y);
            assign y = {4'hA, 4'hB};
        endmodule
    ");
    let env = run(&module, &[]);
    assert_eq!(env["y"], Value::from_u64(8, 0xAB));
    assert_eq!(env["y"].to_string_radix(Radix::Hex), "ab");
}

#[test]
fn wires_are_evaluated_in_dependency_order() {
    let (module, diagnostics) = load("
        module chain(input [3:0] x, output [3:0] out);
            wire [3:0] t2;
            assign out = t2 ^ 4'hF;
            assign t2 = t1 + 4'd1;
            wire [3:0] t1 = x << 1;
        endmodule
    ");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");

    let order: Vec<&str> = module.wires.iter().map(|wire| wire.name.as_str()).collect();
    assert_eq!(order, vec!["t1", "t2", "out"]);
    for (i, wire) in module.wires.iter().enumerate() {
        for dep in &wire.deps {
            let j = module.wires.iter().position(|w| &w.name == dep).unwrap();
            assert!(j < i);
        }
    }

    let env = run(&module, &[("x", "4'd3")]);
    assert_eq!(env["t1"], Value::from_u64(4, 6));
    assert_eq!(env["out"], Value::from_u64(4, 0b1000));
}

#[test]
fn cycles_are_fatal() {
    let builder = CstBuilder::new();
    let mut diagnostics = Diagnostics::new();
    let result = load_module_from_string(&builder, "
        module loop(output a);
            wire b;
            assign a = b;
            assign b = a;
        endmodule
    ", None, &mut diagnostics);
    match result {
        Err(CombsimError::Sort(SortError::CycleDetected(names))) => assert_eq!(names, vec!["a", "b"]),
        other => panic!("Expected a cycle, got {other:?}"),
    }
}

#[test]
fn conditional_does_not_evaluate_untaken_branch() {
    let module = Module {
        name: "m".to_string(),
        inputs: vec![Input { name: "s".to_string(), width: 1 }],
        wires: vec![Wire::new(
            "y",
            4,
            Expr::Cond(
                Box::new(Expr::Register("s".to_string())),
                Box::new(Expr::Constant("4'h9".to_string())),
                Box::new(Expr::Register("unbound".to_string())),
            ),
        )],
        outputs: vec!["y".to_string()],
    };
    let env = run(&module, &[("s", "1'b1")]);
    assert_eq!(env["y"], Value::from_u64(4, 9));

    let mut diagnostics = Diagnostics::new();
    let result = simulate(&module, &inputs(&[("s", "1'b0")]), &mut diagnostics);
    assert!(matches!(result, Err(CombsimError::Eval(EvalError::UnboundSignal(name))) if name == "unbound"));
}

#[test]
fn comments_are_ignored() {
    let (module, diagnostics) = load("
        // a module with comments
        module m(input [3:0] a, /* the result */ output [3:0] y);
            assign y = a /* not a comment: */ / 4'd2; // halved
        endmodule
    ");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let env = run(&module, &[("a", "4'd9")]);
    assert_eq!(env["y"], Value::from_u64(4, 4));
}

#[test]
fn non_ansi_ports_and_selects() {
    let (module, diagnostics) = load("
        module swizzle(a, lo, hi, bit3, rep);
            input [7:0] a;
            output [3:0] lo, hi;
            output bit3;
            output [5:0] rep;
            assign lo = a[3:0];
            assign hi = a[7 -: 4];
            assign bit3 = a[3];
            assign rep = {3{a[1:0]}};
        endmodule
    ");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    assert_eq!(module.input("a").map(|input| input.width), Some(8));
    assert_eq!(module.wire("rep").map(|wire| wire.width), Some(6));

    let env = run(&module, &[("a", "8'b1100_1010")]);
    assert_eq!(env["lo"], Value::from_u64(4, 0b1010));
    assert_eq!(env["hi"], Value::from_u64(4, 0b1100));
    assert_eq!(env["bit3"], Value::from(true));
    assert_eq!(env["rep"], Value::from_u64(6, 0b10_10_10));
}

#[test]
fn output_redeclared_as_wire() {
    let (module, diagnostics) = load("
        module m(x, y);
            input [1:0] x;
            output [1:0] y;
            wire [1:0] y = ~x;
        endmodule
    ");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    let env = run(&module, &[("x", "2'b01")]);
    assert_eq!(env["y"], Value::from_u64(2, 0b10));
}

#[test]
fn recoverable_conditions_are_reported() {
    let (module, diagnostics) = load("
        module m(input [3:0] a, output [3:0] y, output [3:0] z, output [3:0] unused);
            assign a = 4'd1;
            assign q = 4'd1;
            assign y = a;
            assign y = a + 1;
            assign z = a[W:0];
        endmodule
    ");

    assert_eq!(module.wires.len(), 1);
    assert!(diagnostics.mentions("Assignment to input: a"));
    assert!(diagnostics.mentions("Assignment to undeclared net: q"));
    assert!(diagnostics.mentions("Wire is assigned more than once: y"));
    assert!(diagnostics.mentions("Skipping assignment to z"));
    assert!(diagnostics.mentions("Output declared but never assigned: unused"));

    let warning = diagnostics.iter().find(|d| d.message.contains("undeclared net: q")).unwrap();
    assert_eq!(warning.loc.as_ref().map(|loc| loc.start().line()), Some(4));

    let env = run(&module, &[("a", "4'd5")]);
    assert_eq!(env["y"], Value::from_u64(4, 5));
    assert!(!env.contains_key("z"));
}

#[test]
fn syntax_errors_are_fatal() {
    let builder = CstBuilder::new();
    let mut diagnostics = Diagnostics::new();
    let result = load_module_from_string(&builder, "
        module m(input a, output y);
            assign y = a +;
        endmodule
    ", None, &mut diagnostics);
    match result {
        Err(CombsimError::Translate(TranslateError::SyntaxError(Some(loc)))) => assert_eq!(loc.start().line(), 3),
        other => panic!("Expected a syntax error, got {other:?}"),
    }
}

#[test]
fn top_selects_module() {
    let builder = CstBuilder::new();
    let mut diagnostics = Diagnostics::new();
    let text = "
        module first(input a, output y); assign y = a; endmodule
        module second(input a, output y); assign y = !a; endmodule
    ";

    let module = load_module_from_string(&builder, text, Some("second"), &mut diagnostics).unwrap();
    let env = run(&module, &[("a", "1'b0")]);
    assert_eq!(env["y"], Value::from(true));

    let module = load_module_from_string(&builder, text, None, &mut diagnostics).unwrap();
    assert_eq!(module.name, "first");

    let result = load_module_from_string(&builder, text, Some("third"), &mut diagnostics);
    assert!(matches!(result, Err(CombsimError::Translate(TranslateError::NoSuchModule(_)))));
}

#[test]
fn retranslation_carries_inputs() {
    let (before, _diagnostics) = load("module m(input [7:0] a, output [7:0] y); assign y = a; endmodule");
    let (after, _diagnostics) = load("module m(input [3:0] a, input b, output [3:0] y); assign y = a; endmodule");

    let env = run(&before, &[("a", "8'hA7")]);
    let carried = carry_inputs(&env, &after);
    assert_eq!(carried["a"], Value::from_u64(4, 0x7));
    assert_eq!(carried["b"], Value::zero(1));

    let mut diagnostics = Diagnostics::new();
    let env = simulate(&after, &carried, &mut diagnostics).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(env["y"], Value::from_u64(4, 0x7));
}

#[test]
fn wide_values() {
    let (module, _diagnostics) = load("
        module wide(input [127:0] a, output [127:0] y, output [127:0] z);
            assign y = a + 128'd1;
            assign z = {64'hFFFF_FFFF_FFFF_FFFF, 64'h0} >> 4;
        endmodule
    ");
    let env = run(&module, &[("a", "128'hFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF")]);
    assert_eq!(env["y"], Value::zero(128));
    assert_eq!(env["z"].to_string_radix(Radix::Hex), "0ffffffffffffffff000000000000000");
}
