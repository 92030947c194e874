//! AWS bootstrap document
//!
//! Renders the shared per-group networking (VPC, subnet, routing, security
//! group, key pair) from a handful of typed parameters. The document is built
//! as a JSON tree, so parameters are never spliced into text.
//!
//! Provider credentials and region stay as `${var.aws_*}` references; they
//! are bound later by the template builder or left to the executor.

use crate::regions::{self, REGIONS};
use serde_json::{Map, Value, json};
use stackflow_core::{Result, StackError};

/// Deferred availability zone lookup, resolved by the executor
pub const DEFERRED_AVAILABILITY_ZONE: &str =
    "${lookup(var.aws_availability_zones, var.aws_region)}";

const DEFAULT_CIDR_BLOCK: &str = "10.0.0.0/16";

/// Parameters of the bootstrap document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapParams {
    pub availability_zone: String,
    pub key_pair_name: String,
    pub public_key: String,
    pub environment_name: String,
}

impl BootstrapParams {
    /// Availability zone for a region, deferred when the region is unknown.
    pub fn availability_zone_for(region: &str) -> Result<String> {
        if region.is_empty() {
            return Ok(DEFERRED_AVAILABILITY_ZONE.to_string());
        }

        regions::lookup(region)
            .map(|r| r.availability_zone.to_string())
            .ok_or_else(|| StackError::Validation(format!("region '{}' is not supported", region)))
    }
}

/// Render the bootstrap document.
///
/// Identical parameters always produce byte-identical output.
pub fn render(params: &BootstrapParams) -> Result<String> {
    Ok(serde_json::to_string_pretty(&document(params))?)
}

/// The bootstrap document as a tree.
pub fn document(params: &BootstrapParams) -> Value {
    let zones: Map<String, Value> = REGIONS
        .iter()
        .map(|r| (r.name.to_string(), json!(r.availability_zone)))
        .collect();
    let amis: Map<String, Value> = REGIONS
        .iter()
        .map(|r| (r.name.to_string(), json!(r.ami)))
        .collect();

    json!({
        "provider": {
            "aws": {
                "access_key": "${var.aws_access_key}",
                "secret_key": "${var.aws_secret_key}",
                "region": "${var.aws_region}"
            }
        },
        "output": {
            "vpc": { "value": "${aws_vpc.vpc.id}" },
            "cidr_block": { "value": "${aws_vpc.vpc.cidr_block}" },
            "rtb": { "value": "${aws_vpc.vpc.main_route_table_id}" },
            "acl": { "value": "${aws_vpc.vpc.default_network_acl_id}" },
            "igw": { "value": "${aws_internet_gateway.main_vpc_igw.id}" },
            "subnet": { "value": "${aws_subnet.main_subnet.id}" },
            "sg": { "value": "${aws_security_group.allow_all.id}" },
            "ami": { "value": "${lookup(var.aws_amis, var.aws_region)}" },
            "key_pair": { "value": "${aws_key_pair.platform_key_pair.key_name}" },
            "region": { "value": "${var.aws_region}" }
        },
        "resource": {
            "aws_vpc": {
                "vpc": {
                    "cidr_block": "${var.cidr_block}",
                    "tags": { "Name": "${var.environment_name}" }
                }
            },
            "aws_internet_gateway": {
                "main_vpc_igw": {
                    "tags": { "Name": "${var.environment_name}" },
                    "vpc_id": "${aws_vpc.vpc.id}"
                }
            },
            "aws_subnet": {
                "main_subnet": {
                    "availability_zone": params.availability_zone,
                    "cidr_block": "${var.cidr_block}",
                    "map_public_ip_on_launch": true,
                    "tags": {
                        "Name": "${var.environment_name}",
                        "subnet": "public"
                    },
                    "vpc_id": "${aws_vpc.vpc.id}"
                }
            },
            "aws_route_table": {
                "public": {
                    "route": {
                        "cidr_block": "0.0.0.0/0",
                        "gateway_id": "${aws_internet_gateway.main_vpc_igw.id}"
                    },
                    "tags": {
                        "Name": "${var.environment_name}",
                        "subnet": "public"
                    },
                    "vpc_id": "${aws_vpc.vpc.id}"
                }
            },
            "aws_route_table_association": {
                "public-1": {
                    "route_table_id": "${aws_route_table.public.id}",
                    "subnet_id": "${aws_subnet.main_subnet.id}"
                }
            },
            "aws_security_group": {
                "allow_all": {
                    "description": "Allow all inbound and outbound traffic",
                    "ingress": {
                        "from_port": 0,
                        "to_port": 0,
                        "protocol": "-1",
                        "cidr_blocks": ["0.0.0.0/0"],
                        "self": true
                    },
                    "egress": {
                        "from_port": 0,
                        "to_port": 0,
                        "protocol": "-1",
                        "cidr_blocks": ["0.0.0.0/0"],
                        "self": true
                    },
                    "name": "allow_all",
                    "tags": { "Name": "${var.environment_name}" },
                    "vpc_id": "${aws_vpc.vpc.id}"
                }
            },
            "aws_key_pair": {
                "platform_key_pair": {
                    "key_name": "${var.key_name}",
                    "public_key": "${var.public_key}"
                }
            }
        },
        "variable": {
            "cidr_block": { "default": DEFAULT_CIDR_BLOCK },
            "environment_name": { "default": params.environment_name },
            "aws_availability_zones": { "default": zones },
            "aws_amis": { "default": amis },
            "key_name": { "default": params.key_pair_name },
            "public_key": { "default": params.public_key }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackflow_core::Template;

    fn params() -> BootstrapParams {
        BootstrapParams {
            availability_zone: "us-east-1b".into(),
            key_pair_name: "stackflow-g1-cred-1".into(),
            public_key: "ssh-rsa AAAA test@example".into(),
            environment_name: "StackFlow-g1".into(),
        }
    }

    #[test]
    fn test_render_is_deterministic() {
        assert_eq!(render(&params()).unwrap(), render(&params()).unwrap());
    }

    #[test]
    fn test_render_embeds_params_as_values() {
        let mut p = params();
        p.public_key = r#"ssh-rsa "quoted" key"#.into();

        let rendered = render(&p).unwrap();
        let doc: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(doc["variable"]["public_key"]["default"], r#"ssh-rsa "quoted" key"#);
        assert_eq!(
            doc["resource"]["aws_subnet"]["main_subnet"]["availability_zone"],
            "us-east-1b"
        );
        assert_eq!(doc["variable"]["aws_amis"]["default"]["eu-west-1"], "ami-7c4b0a0b");
    }

    #[test]
    fn test_provider_variables_stay_deferred() {
        let tmpl = Template::parse(&render(&params()).unwrap(), "id").unwrap();

        assert_eq!(
            tmpl.unresolved_variables().unwrap(),
            vec!["aws_access_key", "aws_region", "aws_secret_key"]
        );
        assert!(tmpl.unbound_variables().is_empty());
    }

    #[test]
    fn test_availability_zone_for() {
        assert_eq!(BootstrapParams::availability_zone_for("us-west-2").unwrap(), "us-west-2b");
        assert_eq!(
            BootstrapParams::availability_zone_for("").unwrap(),
            DEFERRED_AVAILABILITY_ZONE
        );
        assert!(matches!(
            BootstrapParams::availability_zone_for("mars-1"),
            Err(StackError::Validation(_))
        ));
    }
}
