/// Raw ICMP and TCP sockets need an effective uid of root.
pub fn is_user_sudo() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}
