use crate::packet::IpFamily;
use crate::ResolveError;
use std::net::IpAddr;

/// Resolves `hostname` to the first address of the requested family. IP
/// literals resolve to themselves.
pub(crate) fn lookup_host(hostname: &str, family: IpFamily) -> Result<IpAddr, ResolveError> {
    let ips: Vec<IpAddr> = dns_lookup::lookup_host(hostname).map_err(|e| ResolveError {
        message: format!("could not resolve hostname {hostname}"),
        source: Some(e.into()),
    })?;
    ips.into_iter()
        .find(|ip| match family {
            IpFamily::V4 => matches!(ip, IpAddr::V4(_)),
            IpFamily::V6 => matches!(ip, IpAddr::V6(_)),
        })
        .ok_or_else(|| ResolveError {
            message: format!("no {family} address for {hostname}"),
            source: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn resolves_localhost_to_v4() {
        let ip = lookup_host("localhost", IpFamily::V4).unwrap();
        assert_eq!(IpAddr::V4(Ipv4Addr::LOCALHOST), ip);
    }

    #[test]
    fn ip_literal_resolves_to_itself() {
        let ip = lookup_host("192.0.2.1", IpFamily::V4).unwrap();
        assert_eq!(IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1)), ip);
    }

    #[test]
    fn v6_literal_resolves_to_itself() {
        let ip = lookup_host("::1", IpFamily::V6).unwrap();
        assert_eq!("::1".parse::<IpAddr>().unwrap(), ip);
    }

    #[test]
    fn unknown_host_is_an_error() {
        let result = lookup_host("does-not-exist.invalid.", IpFamily::V4);
        assert!(result.is_err());
    }

    #[test]
    fn wrong_family_literal_is_an_error() {
        let result = lookup_host("192.0.2.1", IpFamily::V6);
        assert!(result.is_err());
    }
}
