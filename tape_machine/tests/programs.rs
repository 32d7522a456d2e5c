use tape_machine::{Command, Machine, Program, TAPE_SIZE, TapeErr};

#[test]
fn marks_a_run_of_cells_to_the_right() {
    // Marks the start cell and the three to its right, then halts.
    let source = "star right star right star right star";
    let mut machine = Machine::new(source.parse().unwrap());

    let executed = machine.run(1000).unwrap();
    assert_eq!(executed, 7);
    assert!(machine.is_halted());

    let middle = TAPE_SIZE / 2;
    let marked: Vec<_> = (0..TAPE_SIZE).filter(|&i| machine.tape()[i]).collect();
    assert_eq!(marked, vec![middle, middle + 1, middle + 2, middle + 3]);
}

#[test]
fn endless_walk_falls_off_the_tape() {
    // Marks every cell left of the start while walking left forever.
    let program: Program = "left star c_n 0".parse().unwrap();
    let mut machine = Machine::new(program);

    let err = machine.run(1000).unwrap_err();
    assert!(matches!(err, TapeErr::HeadOutOfBounds { position: 0, .. }));
    assert!(machine.tape()[..TAPE_SIZE / 2].iter().all(|&cell| cell));
    assert!(!machine.tape()[TAPE_SIZE / 2]);
}

#[test]
fn program_text_survives_formatting() {
    let program = Program::new(vec![
        Command::Right,
        Command::CondJump(3),
        Command::Star,
        Command::Left,
    ]);

    let text = program.to_string();
    assert_eq!(text, "right c_n 3 star left");
    assert_eq!(text.parse::<Program>().unwrap(), program);
}
