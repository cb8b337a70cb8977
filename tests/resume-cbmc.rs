#[macro_use]
extern crate difference;

use std::env;
use std::fs::File;
use std::io::Read;
use std::process::Command;

fn test_resume_with(total_iters: u64, first_iters: u64) {
    let dir = tempfile::tempdir().expect("Unable to create temp directory");
    let mut root = env::current_exe()
        .unwrap()
        .parent()
        .expect("executable's directory")
        .to_path_buf();
    if root.ends_with("deps") {
        root.pop();
    }
    println!("root and dir are {:?} and {:?}", root, dir);
    let mut cmd = Command::new(root.join("hexane-cbmc"));
    cmd.env("RUST_BACKTRACE", "1");
    cmd.current_dir(dir.path()).args(&["--help"]);
    let out = cmd.output().expect("command failed to run");
    println!("{}", String::from_utf8_lossy(&out.stdout));
    println!("{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.status.success());

    let common_flags = &[
        "--cells=2",
        "--expansion=1.1",
        "--hard-sphere-sigma=1",
        "--temperature=1",
        "--num-trial=10",
        "--rigid",
        "--seed=5",
    ];

    println!("About to start the long run for {} moves", total_iters);
    let total_max_iter = format!("--max-iter={}", total_iters);
    let first_max_iter = format!("--max-iter={}", first_iters);
    let mut cmd = Command::new(root.join("hexane-cbmc"));
    cmd.env("RUST_BACKTRACE", "1");
    cmd.current_dir(dir.path())
        .args(common_flags)
        .args(&[&total_max_iter, "--save-as=long.yaml"]);
    let out = cmd.output().expect("command failed to run");
    println!("{}", String::from_utf8_lossy(&out.stdout));
    println!("{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.status.success());

    println!("About to start the short run");
    let mut cmd = Command::new(root.join("hexane-cbmc"));
    cmd.current_dir(dir.path())
        .args(common_flags)
        .args(&[&first_max_iter, "--save-as=short.yaml"]);
    let out = cmd.output().expect("command failed to run");
    println!("{}", String::from_utf8_lossy(&out.stdout));
    println!("{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.status.success());

    println!("About to resume the short run");
    let mut cmd = Command::new(root.join("hexane-cbmc"));
    cmd.current_dir(dir.path())
        .args(common_flags)
        .args(&[&total_max_iter, "--save-as=short.yaml"]);
    let out = cmd.output().expect("command failed to run");
    println!("{}", String::from_utf8_lossy(&out.stdout));
    println!("{}", String::from_utf8_lossy(&out.stderr));
    assert!(out.status.success());

    let mut f1 = File::open(dir.path().join("long.yaml")).unwrap();
    let mut s1 = String::new();
    f1.read_to_string(&mut s1).unwrap();

    let mut f2 = File::open(dir.path().join("short.yaml")).unwrap();
    let mut s2 = String::new();
    f2.read_to_string(&mut s2).unwrap();

    println!("\n\n\nRUNNING WITH {} and {}", total_iters, first_iters);
    assert_diff!(&s1, &s2, "\n", 2); // The save_as line differs.
}

#[test]
fn resume_short() {
    test_resume_with(2, 1);
    test_resume_with(100, 37);
    test_resume_with(1_000, 999);
}

#[test]
fn resume_long() {
    test_resume_with(20_000, 10_000);
}
