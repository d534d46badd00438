/*!
 * S3 static-website endpoints by region
 */

/// Website hosting endpoint for one region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Human readable region name
    pub name: &'static str,

    /// Website endpoint host
    pub host: &'static str,

    /// Route 53 hosted zone id for alias records, if published
    pub zone_id: Option<&'static str>,
}

/// Region code → website endpoint
pub const REGION_ENDPOINTS: &[(&str, Endpoint)] = &[
    (
        "us-east-2",
        Endpoint {
            name: "US East (Ohio)",
            host: "s3-website.us-east-2.amazonaws.com",
            zone_id: Some("Z2O1EMRO9K5GLX"),
        },
    ),
    (
        "us-east-1",
        Endpoint {
            name: "US East (N. Virginia)",
            host: "s3-website-us-east-1.amazonaws.com",
            zone_id: Some("Z3AQBSTGFYJSTF"),
        },
    ),
    (
        "us-west-1",
        Endpoint {
            name: "US West (N. California)",
            host: "s3-website-us-west-1.amazonaws.com",
            zone_id: Some("Z2F56UZL2M1ACD"),
        },
    ),
    (
        "us-west-2",
        Endpoint {
            name: "US West (Oregon)",
            host: "s3-website-us-west-2.amazonaws.com",
            zone_id: Some("Z3BJ6K6RIION7M"),
        },
    ),
    (
        "ca-central-1",
        Endpoint {
            name: "Canada (Central)",
            host: "s3-website.ca-central-1.amazonaws.com",
            zone_id: Some("Z1QDHH18159H29"),
        },
    ),
    (
        "ap-south-1",
        Endpoint {
            name: "Asia Pacific (Mumbai)",
            host: "s3-website.ap-south-1.amazonaws.com",
            zone_id: Some("Z11RGJOFQNVJUP"),
        },
    ),
    (
        "ap-northeast-2",
        Endpoint {
            name: "Asia Pacific (Seoul)",
            host: "s3-website.ap-northeast-2.amazonaws.com",
            zone_id: Some("Z3W03O7B5YMIYP"),
        },
    ),
    (
        "ap-northeast-3",
        Endpoint {
            name: "Asia Pacific (Osaka-Local)",
            host: "s3-website.ap-northeast-3.amazonaws.com",
            zone_id: Some("Z2YQB5RD63NC85"),
        },
    ),
    (
        "ap-southeast-1",
        Endpoint {
            name: "Asia Pacific (Singapore)",
            host: "s3-website-ap-southeast-1.amazonaws.com",
            zone_id: Some("Z3O0J2DXBE1FTB"),
        },
    ),
    (
        "ap-southeast-2",
        Endpoint {
            name: "Asia Pacific (Sydney)",
            host: "s3-website-ap-southeast-2.amazonaws.com",
            zone_id: Some("Z1WCIGYICN2BYD"),
        },
    ),
    (
        "ap-northeast-1",
        Endpoint {
            name: "Asia Pacific (Tokyo)",
            host: "s3-website-ap-northeast-1.amazonaws.com",
            zone_id: Some("Z2M4EHUR26P7ZW"),
        },
    ),
    (
        "cn-northwest-1",
        Endpoint {
            name: "China (Ningxia)",
            host: "s3-website.cn-northwest-1.amazonaws.com.cn",
            zone_id: None,
        },
    ),
    (
        "eu-central-1",
        Endpoint {
            name: "EU (Frankfurt)",
            host: "s3-website.eu-central-1.amazonaws.com",
            zone_id: Some("Z21DNDUVLTQW6Q"),
        },
    ),
    (
        "eu-west-1",
        Endpoint {
            name: "EU (Ireland)",
            host: "s3-website-eu-west-1.amazonaws.com",
            zone_id: Some("Z1BKCTXD74EZPE"),
        },
    ),
    (
        "eu-west-2",
        Endpoint {
            name: "EU (London)",
            host: "s3-website.eu-west-2.amazonaws.com",
            zone_id: Some("Z3GKZC51ZF0DB4"),
        },
    ),
    (
        "eu-west-3",
        Endpoint {
            name: "EU (Paris)",
            host: "s3-website.eu-west-3.amazonaws.com",
            zone_id: Some("Z3R1K369G5AVDG"),
        },
    ),
    (
        "sa-east-1",
        Endpoint {
            name: "South America (São Paulo)",
            host: "s3-website-sa-east-1.amazonaws.com",
            zone_id: Some("Z7KQH4QJS55SO"),
        },
    ),
];

/// Website endpoint for `region`
pub fn get_endpoint(region: &str) -> Option<&'static Endpoint> {
    REGION_ENDPOINTS
        .iter()
        .find(|(code, _)| *code == region)
        .map(|(_, endpoint)| endpoint)
}

/// Public website URL of `bucket` in `region`
pub fn website_url(bucket: &str, region: &str) -> Option<String> {
    get_endpoint(region).map(|ep| format!("http://{}.{}", bucket, ep.host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_regions() {
        assert!(get_endpoint("us-east-1").is_some());
        assert!(get_endpoint("eu-west-3").is_some());
        assert!(get_endpoint("mars-north-1").is_none());
    }

    #[test]
    fn test_endpoint_lookup() {
        let ep = get_endpoint("us-west-2").unwrap();
        assert_eq!(ep.host, "s3-website-us-west-2.amazonaws.com");
        assert_eq!(ep.zone_id, Some("Z3BJ6K6RIION7M"));
        assert_eq!(get_endpoint("cn-northwest-1").unwrap().zone_id, None);
    }

    #[test]
    fn test_website_url() {
        assert_eq!(
            website_url("example.com", "eu-central-1").as_deref(),
            Some("http://example.com.s3-website.eu-central-1.amazonaws.com")
        );
        assert_eq!(website_url("example.com", "nowhere"), None);
    }

    #[test]
    fn test_region_codes_unique() {
        let mut codes: Vec<_> = REGION_ENDPOINTS.iter().map(|(c, _)| *c).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), REGION_ENDPOINTS.len());
    }
}
