use std::{env, path::PathBuf};

const INCLUDED_TYPES: &[&str] = &[
    "cdev",
    "class",
    "device",
    "dev_t",
    "file",
    "file_operations",
    "gfp_t",
    "inode",
    "loff_t",
    "ssize_t",
    "module",
];
const INCLUDED_FUNCTIONS: &[&str] = &[
    "alloc_chrdev_region",
    "register_chrdev_region",
    "unregister_chrdev_region",
    "cdev_init",
    "cdev_add",
    "cdev_del",
    "class_destroy",
    "device_create",
    "device_destroy",
    "krealloc",
    "kfree",
    "printk",
    "_printk",
];
const INCLUDED_VARS: &[&str] = &[
    "BINDINGS_GFP_KERNEL",
    "EINVAL",
    "ENOMEM",
    "EBUSY",
    "MAX_ERRNO",
    "MINORBITS",
    "__this_module",
    "KERN_INFO",
    "KERN_EMERG",
    "KERN_ALERT",
    "KERN_CRIT",
    "KERN_ERR",
    "KERN_WARNING",
    "KERN_NOTICE",
    "KERN_DEBUG",
    "KERN_DEFAULT",
    "KERN_CONT",
    "LINUX_VERSION_CODE",
];
const OPAQUE_TYPES: &[&str] = &[
    // These need to be opaque because they're both packed and aligned, which rustc
    // doesn't support yet. See https://github.com/rust-lang/rust/issues/59154
    // and https://github.com/rust-lang/rust-bindgen/issues/1538
    "desc_struct",
    "xregs_state",
];

// Takes the CFLAGS from the kernel Makefile and changes all the include paths to be absolute
// instead of relative.
fn prepare_cflags(cflags: &str, kernel_dir: &str) -> Vec<String> {
    let cflag_parts = shlex::split(cflags).expect("c_flags is not valid shell syntax");
    let mut cflag_iter = cflag_parts.iter();
    let mut kernel_args = vec![];
    while let Some(arg) = cflag_iter.next() {
        if arg.starts_with("-I") && !arg.starts_with("-I/") {
            kernel_args.push(format!("-I{}/{}", kernel_dir, &arg[2..]));
        } else if arg == "-include" {
            kernel_args.push(arg.to_string());
            let include_path = cflag_iter.next().expect("-include without a path");
            if include_path.starts_with('/') {
                kernel_args.push(include_path.to_string());
            } else {
                kernel_args.push(format!("{}/{}", kernel_dir, include_path));
            }
        } else {
            kernel_args.push(arg.to_string());
        }
    }
    kernel_args
}

fn main() {
    println!("cargo:rerun-if-env-changed=CC");
    println!("cargo:rerun-if-env-changed=KDIR");
    println!("cargo:rerun-if-env-changed=c_flags");

    let kernel_dir = env::var("KDIR").expect("KDIR must point at a configured kernel tree");
    let mut kernel_cflags = env::var("c_flags").expect("Add 'export c_flags' to Kbuild");
    for unsupported in [
        "-mfunction-return=thunk-extern",
        "-fzero-call-used-regs=used-gpr",
        "-fconserve-stack",
        "-mrecord-mcount",
        "-Wno-alloc-size-larger-than",
    ] {
        kernel_cflags = kernel_cflags.replace(unsupported, "");
    }
    kernel_cflags = kernel_cflags.replace("-Wno-maybe-uninitialized", "-Wno-uninitialized");
    kernel_cflags = kernel_cflags.replace("-Wimplicit-fallthrough=5", "-Wimplicit-fallthrough");

    let kbuild_cflags_module =
        env::var("KBUILD_CFLAGS_MODULE").expect("Must be invoked from kernel makefile");

    let cflags = format!("{} {}", kernel_cflags, kbuild_cflags_module);
    let kernel_args = prepare_cflags(&cflags, &kernel_dir);

    let target = env::var("TARGET").expect("cargo sets TARGET");

    let mut builder = bindgen::Builder::default()
        .use_core()
        .ctypes_prefix("core::ffi")
        .derive_default(true)
        .size_t_is_usize(true)
        .layout_tests(false)
        .enable_function_attribute_detection();

    builder = builder.clang_arg(format!("--target={}", target));
    for arg in kernel_args.iter() {
        builder = builder.clang_arg(arg.clone());
    }

    println!("cargo:rerun-if-changed=src/bindings_helper.h");
    builder = builder.header("src/bindings_helper.h");

    for t in INCLUDED_TYPES {
        builder = builder.allowlist_type(t);
    }
    for f in INCLUDED_FUNCTIONS {
        builder = builder.allowlist_function(f);
    }
    for v in INCLUDED_VARS {
        builder = builder.allowlist_var(v);
    }
    for t in OPAQUE_TYPES {
        builder = builder.opaque_type(t);
    }
    let bindings = builder.generate().expect("Unable to generate bindings");

    let out_path = PathBuf::from(env::var("OUT_DIR").expect("cargo sets OUT_DIR"));
    bindings
        .write_to_file(out_path.join("bindings_c.rs"))
        .expect("Couldn't write bindings!");

    let mut builder = cc::Build::new();
    builder.compiler(env::var("CC").unwrap_or_else(|_| "clang".to_string()));
    builder.target(&target);
    builder.warnings(false);
    println!("cargo:rerun-if-changed=src/helpers.c");
    builder.file("src/helpers.c");
    for arg in kernel_args.iter() {
        builder.flag(arg);
    }
    builder.remove_flag("-pg");
    builder.compile("helpers");
}
