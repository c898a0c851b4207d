use cfg_aliases::cfg_aliases;

fn main() {
    cfg_aliases! {
        noctime: { any(
            target_os = "freebsd",
            target_os = "openbsd",
            target_vendor = "apple"
        ) },
        linux_all: { any(target_os = "linux", target_os = "android") },
    }
}
