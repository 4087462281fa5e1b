/// IMAP hosts of well-known providers, keyed by the account's mail domain.
const KNOWN_SERVERS: &[(&str, &str)] = &[
    ("gmail.com", "imap.gmail.com"),
    ("outlook.com", "outlook.office365.com"),
    ("yahoo.com", "imap.mail.yahoo.com"),
    ("aol.com", "imap.aol.com"),
    ("icloud.com", "imap.mail.me.com"),
    ("zoho.com", "imap.zoho.com"),
    ("protonmail.com", "imap.protonmail.ch"),
    ("mail.com", "imap.mail.com"),
    ("yandex.com", "imap.yandex.com"),
    ("gmx.com", "imap.gmx.com"),
    ("hotmail.com", "imap-mail.outlook.com"),
    ("live.com", "imap-mail.outlook.com"),
    ("msn.com", "imap-mail.outlook.com"),
    ("me.com", "imap.mail.me.com"),
    ("att.net", "imap.mail.att.net"),
    ("verizon.net", "incoming.verizon.net"),
    ("cox.net", "imap.cox.net"),
    ("charter.net", "mobile.charter.net"),
    ("earthlink.net", "imap.earthlink.net"),
    ("rr.com", "mail.twc.com"),
];

pub fn imap_host_for(user: &str) -> Option<&'static str> {
    let domain = user.rsplit('@').next()?.trim().to_ascii_lowercase();
    KNOWN_SERVERS
        .iter()
        .find(|(known, _)| *known == domain)
        .map(|(_, host)| *host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_domains_case_insensitively() {
        assert_eq!(imap_host_for("me@gmail.com"), Some("imap.gmail.com"));
        assert_eq!(imap_host_for("Me@Hotmail.COM"), Some("imap-mail.outlook.com"));
    }

    #[test]
    fn unknown_domain_has_no_host() {
        assert_eq!(imap_host_for("me@example.org"), None);
        assert_eq!(imap_host_for("no-at-sign"), None);
    }
}
