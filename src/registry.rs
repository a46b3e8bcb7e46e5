//! The supported resource-type registry: a static list of `AWS::Service::Resource` strings
//! checked into the binary, plus the `IS_GLOBAL_SERVICE` predicate used to decide whether a
//! type contributes one expected key total or one per region.
//!
//! This is configuration, not logic -- it dwarfs the rest of the crate in line count.

use tracing::warn;

/// Supported `AWS::Service::Resource` Cloud Control type names. A broad subset of the several
/// hundred types Cloud Control actually exposes, spanning the services most commonly enumerated
/// by cloud inventory tooling. Short of full parity with every registered Cloud Control type --
/// see the registry coverage note in DESIGN.md.
pub static SUPPORTED_RESOURCE_TYPES: &[&str] = &[
    // EC2
    "AWS::EC2::Instance",
    "AWS::EC2::VPC",
    "AWS::EC2::Subnet",
    "AWS::EC2::SecurityGroup",
    "AWS::EC2::Volume",
    "AWS::EC2::Snapshot",
    "AWS::EC2::Image",
    "AWS::EC2::RouteTable",
    "AWS::EC2::NatGateway",
    "AWS::EC2::NetworkInterface",
    "AWS::EC2::VPCEndpoint",
    "AWS::EC2::NetworkAcl",
    "AWS::EC2::KeyPair",
    "AWS::EC2::InternetGateway",
    "AWS::EC2::EgressOnlyInternetGateway",
    "AWS::EC2::EIP",
    "AWS::EC2::FlowLog",
    "AWS::EC2::TransitGateway",
    "AWS::EC2::TransitGatewayAttachment",
    "AWS::EC2::VPCPeeringConnection",
    "AWS::EC2::LaunchTemplate",
    "AWS::EC2::SpotFleet",
    "AWS::EC2::DHCPOptions",
    "AWS::EC2::CarrierGateway",
    "AWS::EC2::ClientVpnEndpoint",
    // IAM
    "AWS::IAM::Role",
    "AWS::IAM::User",
    "AWS::IAM::Group",
    "AWS::IAM::Policy",
    "AWS::IAM::InstanceProfile",
    "AWS::IAM::OIDCProvider",
    "AWS::IAM::SAMLProvider",
    "AWS::IAM::ServerCertificate",
    "AWS::IAM::VirtualMFADevice",
    // S3
    "AWS::S3::Bucket",
    "AWS::S3::AccessPoint",
    "AWS::S3::MultiRegionAccessPoint",
    "AWS::S3::StorageLens",
    "AWS::S3ObjectLambda::AccessPoint",
    "AWS::S3Outposts::Bucket",
    // Lambda
    "AWS::Lambda::Function",
    "AWS::Lambda::LayerVersion",
    "AWS::Lambda::EventSourceMapping",
    "AWS::Lambda::Alias",
    "AWS::Lambda::CodeSigningConfig",
    "AWS::Lambda::EventInvokeConfig",
    "AWS::Lambda::Url",
    // RDS / DynamoDB / other data stores
    "AWS::RDS::DBInstance",
    "AWS::RDS::DBCluster",
    "AWS::RDS::DBSnapshot",
    "AWS::RDS::DBClusterSnapshot",
    "AWS::RDS::DBParameterGroup",
    "AWS::RDS::DBClusterParameterGroup",
    "AWS::RDS::DBSubnetGroup",
    "AWS::RDS::DBProxy",
    "AWS::RDS::EventSubscription",
    "AWS::RDS::OptionGroup",
    "AWS::DynamoDB::Table",
    "AWS::DynamoDB::GlobalTable",
    "AWS::DAX::Cluster",
    "AWS::ElastiCache::CacheCluster",
    "AWS::ElastiCache::ReplicationGroup",
    "AWS::ElastiCache::ServerlessCache",
    "AWS::MemoryDB::Cluster",
    "AWS::Neptune::DBCluster",
    "AWS::DocDB::DBCluster",
    "AWS::Timestream::Database",
    "AWS::QLDB::Ledger",
    "AWS::Redshift::Cluster",
    "AWS::Redshift::ClusterParameterGroup",
    "AWS::RedshiftServerless::Namespace",
    // CloudWatch / observability
    "AWS::CloudWatch::Alarm",
    "AWS::CloudWatch::Dashboard",
    "AWS::CloudWatch::CompositeAlarm",
    "AWS::CloudWatch::MetricStream",
    "AWS::Logs::LogGroup",
    "AWS::Logs::Destination",
    "AWS::Logs::SubscriptionFilter",
    "AWS::XRay::Group",
    "AWS::XRay::SamplingRule",
    "AWS::Synthetics::Canary",
    "AWS::RUM::AppMonitor",
    "AWS::Evidently::Project",
    // API / messaging
    "AWS::ApiGateway::RestApi",
    "AWS::ApiGateway::ApiKey",
    "AWS::ApiGateway::UsagePlan",
    "AWS::ApiGatewayV2::Api",
    "AWS::AppSync::GraphQLApi",
    "AWS::SNS::Topic",
    "AWS::SNS::Subscription",
    "AWS::SQS::Queue",
    "AWS::Events::EventBus",
    "AWS::Events::Rule",
    "AWS::Scheduler::Schedule",
    "AWS::MQ::Broker",
    "AWS::MSK::Cluster",
    "AWS::Kinesis::Stream",
    "AWS::KinesisFirehose::DeliveryStream",
    "AWS::KinesisAnalyticsV2::Application",
    // Containers / compute
    "AWS::ECS::Cluster",
    "AWS::ECS::Service",
    "AWS::ECS::TaskDefinition",
    "AWS::ECS::CapacityProvider",
    "AWS::EKS::Cluster",
    "AWS::EKS::Nodegroup",
    "AWS::EKS::FargateProfile",
    "AWS::ECR::Repository",
    "AWS::ECR::PublicRepository",
    "AWS::AppRunner::Service",
    "AWS::Batch::ComputeEnvironment",
    "AWS::Batch::JobQueue",
    "AWS::Batch::JobDefinition",
    "AWS::AutoScaling::AutoScalingGroup",
    "AWS::AutoScaling::LaunchConfiguration",
    "AWS::ElasticBeanstalk::Application",
    "AWS::ElasticBeanstalk::Environment",
    "AWS::OpsWorks::Stack",
    "AWS::LightSail::Instance",
    // Load balancing / networking
    "AWS::ElasticLoadBalancingV2::LoadBalancer",
    "AWS::ElasticLoadBalancingV2::TargetGroup",
    "AWS::ElasticLoadBalancingV2::Listener",
    "AWS::ElasticLoadBalancing::LoadBalancer",
    "AWS::GlobalAccelerator::Accelerator",
    "AWS::NetworkFirewall::Firewall",
    "AWS::NetworkFirewall::FirewallPolicy",
    "AWS::NetworkManager::GlobalNetwork",
    "AWS::DirectConnect::Connection",
    "AWS::ServiceDiscovery::Service",
    "AWS::AppMesh::Mesh",
    // CloudFormation / orchestration
    "AWS::CloudFormation::Stack",
    "AWS::CloudFormation::StackSet",
    "AWS::ServiceCatalog::Portfolio",
    "AWS::ServiceCatalog::CloudFormationProduct",
    "AWS::ResourceGroups::Group",
    "AWS::StepFunctions::StateMachine",
    "AWS::StepFunctions::Activity",
    // CI/CD
    "AWS::CodeBuild::Project",
    "AWS::CodePipeline::Pipeline",
    "AWS::CodeCommit::Repository",
    "AWS::CodeDeploy::Application",
    "AWS::CodeArtifact::Repository",
    "AWS::CodeArtifact::Domain",
    "AWS::CodeStar::GitHubRepository",
    // ML / AI
    "AWS::SageMaker::Endpoint",
    "AWS::SageMaker::Model",
    "AWS::SageMaker::NotebookInstance",
    "AWS::SageMaker::Domain",
    "AWS::Comprehend::Flywheel",
    "AWS::Kendra::Index",
    "AWS::Personalize::Dataset",
    "AWS::Rekognition::Collection",
    "AWS::Lex::Bot",
    "AWS::Forecast::Dataset",
    // Storage / file systems
    "AWS::EFS::FileSystem",
    "AWS::EFS::AccessPoint",
    "AWS::FSx::FileSystem",
    "AWS::Backup::BackupVault",
    "AWS::Backup::BackupPlan",
    "AWS::DataSync::Location",
    "AWS::DataSync::Task",
    "AWS::Transfer::Server",
    "AWS::StorageGateway::Gateway",
    // Security / identity / compliance
    "AWS::KMS::Key",
    "AWS::KMS::Alias",
    "AWS::SecretsManager::Secret",
    "AWS::CloudTrail::Trail",
    "AWS::Config::ConfigRule",
    "AWS::Config::ConfigurationRecorder",
    "AWS::GuardDuty::Detector",
    "AWS::SecurityHub::Hub",
    "AWS::Macie::Session",
    "AWS::Detective::Graph",
    "AWS::WAFv2::WebACL",
    "AWS::WAFv2::IPSet",
    "AWS::WAF::WebACL",
    "AWS::Shield::Protection",
    "AWS::CertificateManager::Certificate",
    "AWS::ACMPCA::CertificateAuthority",
    "AWS::Cognito::UserPool",
    "AWS::Cognito::IdentityPool",
    "AWS::SSO::Assignment",
    "AWS::IdentityStore::Group",
    "AWS::DirectoryService::MicrosoftAD",
    // Networking / DNS / edge (global)
    "AWS::Route53::HostedZone",
    "AWS::Route53::HealthCheck",
    "AWS::Route53Resolver::ResolverRule",
    "AWS::Route53RecoveryControl::Cluster",
    "AWS::CloudFront::Distribution",
    "AWS::CloudFront::OriginAccessControl",
    // Analytics
    "AWS::Athena::WorkGroup",
    "AWS::Athena::DataCatalog",
    "AWS::Glue::Job",
    "AWS::Glue::Database",
    "AWS::Glue::Crawler",
    "AWS::EMR::Cluster",
    "AWS::EMRServerless::Application",
    "AWS::QuickSight::DataSource",
    "AWS::OpenSearchService::Domain",
    "AWS::OpenSearchServerless::Collection",
    // Messaging / end-user computing
    "AWS::SES::ConfigurationSet",
    "AWS::Pinpoint::App",
    "AWS::Connect::Instance",
    "AWS::Chime::AppInstance",
    "AWS::WorkSpaces::Workspace",
    "AWS::WorkMail::Organization",
    "AWS::AppStream::Stack",
    "AWS::AppStream::Fleet",
    // IoT
    "AWS::IoT::Thing",
    "AWS::IoT::TopicRule",
    "AWS::IoTAnalytics::Dataset",
    "AWS::Greengrass::Group",
    "AWS::IoTWireless::WirelessDevice",
    // Billing / organization (global)
    "AWS::Budgets::Budget",
    "AWS::Organizations::Account",
    "AWS::Organizations::OrganizationalUnit",
    "AWS::Organizations::Policy",
    // Misc application services
    "AWS::AppConfig::Application",
    "AWS::Amplify::App",
    "AWS::Chatbot::SlackChannelConfiguration",
    "AWS::MediaConvert::JobTemplate",
    "AWS::MediaLive::Channel",
    "AWS::MediaPackage::Channel",
    "AWS::MediaStore::Container",
    "AWS::Schemas::Registry",
    "AWS::DMS::ReplicationInstance",
    "AWS::DMS::Endpoint",
    "AWS::DMS::ReplicationSubnetGroup",
    "AWS::DMS::ReplicationTask",
    "AWS::DMS::Certificate",
    "AWS::Outposts::Outpost",
    // EC2 (extended networking)
    "AWS::EC2::PrefixList",
    "AWS::EC2::IPAM",
    "AWS::EC2::IPAMPool",
    "AWS::EC2::IPAMScope",
    "AWS::EC2::NetworkInsightsPath",
    "AWS::EC2::NetworkInsightsAnalysis",
    "AWS::EC2::TransitGatewayRouteTable",
    "AWS::EC2::TransitGatewayPeeringAttachment",
    "AWS::EC2::VPNConnection",
    "AWS::EC2::VPNGateway",
    "AWS::EC2::CustomerGateway",
    "AWS::EC2::Host",
    "AWS::EC2::PlacementGroup",
    "AWS::EC2::VPCEndpointService",
    "AWS::EC2::CapacityReservation",
    "AWS::EC2::TrafficMirrorFilter",
    "AWS::EC2::TrafficMirrorSession",
    "AWS::EC2::TrafficMirrorTarget",
    // Containers / data stores (extended)
    "AWS::ECS::Task",
    "AWS::Neptune::DBInstance",
    "AWS::Neptune::DBParameterGroup",
    "AWS::DocDB::DBInstance",
    "AWS::DocDB::DBSubnetGroup",
    // Identity (extended)
    "AWS::Cognito::UserPoolClient",
    "AWS::Cognito::UserPoolDomain",
    "AWS::Cognito::UserPoolGroup",
    "AWS::Cognito::IdentityPoolRoleAttachment",
    // Analytics / BI (extended)
    "AWS::QuickSight::Dashboard",
    "AWS::QuickSight::DataSet",
    "AWS::QuickSight::Analysis",
    "AWS::QuickSight::Template",
    "AWS::Athena::PreparedStatement",
    "AWS::Athena::NamedQuery",
    "AWS::LakeFormation::Resource",
    "AWS::LakeFormation::DataCellsFilter",
    "AWS::EMR::InstanceGroupConfig",
    "AWS::EMR::Studio",
    "AWS::KinesisAnalytics::Application",
    "AWS::KinesisVideo::Stream",
    "AWS::KinesisVideo::SignalingChannel",
    "AWS::Glue::Connection",
    "AWS::Glue::Workflow",
    "AWS::Glue::Trigger",
    "AWS::Glue::Classifier",
    "AWS::Glue::SecurityConfiguration",
    "AWS::Glue::Schema",
    "AWS::Glue::Registry",
    // IoT (extended)
    "AWS::Greengrass::ResourceDefinition",
    "AWS::Greengrass::FunctionDefinition",
    "AWS::GreengrassV2::ComponentVersion",
    "AWS::IoTAnalytics::Pipeline",
    "AWS::IoTAnalytics::Channel",
    "AWS::IoTAnalytics::Datastore",
    "AWS::IoTEvents::DetectorModel",
    "AWS::IoTEvents::Input",
    "AWS::IoTSiteWise::AssetModel",
    "AWS::IoTSiteWise::Gateway",
    "AWS::IoTFleetHub::Application",
    // ML / AI (extended)
    "AWS::Bedrock::Agent",
    "AWS::Bedrock::KnowledgeBase",
    "AWS::Bedrock::Guardrail",
    "AWS::Bedrock::DataSource",
    "AWS::SageMaker::FeatureGroup",
    "AWS::SageMaker::Pipeline",
    "AWS::SageMaker::Project",
    "AWS::SageMaker::Image",
    "AWS::SageMaker::App",
    "AWS::SageMaker::Device",
    "AWS::SageMaker::DeviceFleet",
    "AWS::SageMaker::ModelPackage",
    "AWS::SageMaker::ModelPackageGroup",
    "AWS::Kendra::DataSource",
    "AWS::Kendra::Faq",
    "AWS::FraudDetector::Detector",
    "AWS::FraudDetector::EntityType",
    "AWS::Forecast::DatasetGroup",
    "AWS::Personalize::Solution",
    "AWS::Personalize::Schema",
    "AWS::Polly::Lexicon",
    "AWS::Lex::BotAlias",
    "AWS::Lex::BotVersion",
    "AWS::DataZone::Domain",
    "AWS::DataZone::Project",
    "AWS::CleanRooms::Collaboration",
    // Governance / security (extended)
    "AWS::Config::ConformancePack",
    "AWS::Config::OrganizationConformancePack",
    "AWS::Config::RemediationConfiguration",
    "AWS::GuardDuty::Filter",
    "AWS::GuardDuty::IPSet",
    "AWS::GuardDuty::ThreatIntelSet",
    "AWS::SecurityHub::Standard",
    "AWS::SecurityHub::Insight",
    "AWS::AccessAnalyzer::Analyzer",
    "AWS::AuditManager::Assessment",
    "AWS::LicenseManager::License",
    "AWS::LicenseManager::Grant",
    "AWS::Signer::SigningProfile",
    "AWS::WAFRegional::WebACL",
    "AWS::Shield::ProtectionGroup",
    "AWS::NetworkFirewall::RuleGroup",
    "AWS::NetworkFirewall::TLSInspectionConfiguration",
    // Networking (extended)
    "AWS::NetworkManager::CoreNetwork",
    "AWS::NetworkManager::Site",
    "AWS::NetworkManager::Device",
    "AWS::NetworkManager::Link",
    "AWS::VpcLattice::Service",
    "AWS::VpcLattice::ServiceNetwork",
    "AWS::VpcLattice::TargetGroup",
    "AWS::GlobalAccelerator::Listener",
    "AWS::GlobalAccelerator::EndpointGroup",
    "AWS::ServiceDiscovery::HttpNamespace",
    "AWS::ServiceDiscovery::PrivateDnsNamespace",
    "AWS::ServiceDiscovery::PublicDnsNamespace",
    "AWS::AppMesh::VirtualNode",
    "AWS::AppMesh::VirtualService",
    "AWS::AppMesh::VirtualRouter",
    // CI/CD (extended)
    "AWS::CodeGuruProfiler::ProfilingGroup",
    "AWS::CodeGuruReviewer::RepositoryAssociation",
    "AWS::CodeStarConnections::Connection",
    "AWS::CodeStarNotifications::NotificationRule",
    // Messaging / contact center (extended)
    "AWS::AmazonMQ::Broker",
    "AWS::AmazonMQ::Configuration",
    "AWS::Pipes::Pipe",
    "AWS::AppIntegrations::EventIntegration",
    "AWS::Connect::ContactFlow",
    "AWS::Connect::PhoneNumber",
    "AWS::Connect::User",
    "AWS::Connect::Queue",
    "AWS::Pinpoint::Campaign",
    "AWS::Pinpoint::Segment",
    "AWS::SES::Template",
    "AWS::SES::ReceiptRule",
    "AWS::SESv2::ConfigurationSet",
    "AWS::Chatbot::MicrosoftTeamsChannelConfiguration",
    "AWS::Wisdom::KnowledgeBase",
    "AWS::Wisdom::Assistant",
    "AWS::Chime::VoiceConnector",
    // API (extended)
    "AWS::ApiGateway::Stage",
    "AWS::ApiGateway::Deployment",
    "AWS::ApiGatewayV2::Stage",
    "AWS::ApiGatewayV2::Integration",
    // Media
    "AWS::MediaTailor::PlaybackConfiguration",
    "AWS::MediaConnect::Flow",
    "AWS::IVS::Channel",
    "AWS::IVS::RecordingConfiguration",
    "AWS::IVSChat::Room",
    // Transfer / storage (extended)
    "AWS::Transfer::Workflow",
    "AWS::Transfer::Connector",
    "AWS::Transfer::Agreement",
    "AWS::WorkSpacesWeb::Portal",
    "AWS::WorkSpaces::ConnectionAlias",
    "AWS::AppStream::ImageBuilder",
    "AWS::AppStream::DirectoryConfig",
    "AWS::DataPipeline::Pipeline",
    "AWS::BackupGateway::Gateway",
    // Specialized / emerging services
    "AWS::Cassandra::Keyspace",
    "AWS::Cassandra::Table",
    "AWS::Timestream::Table",
    "AWS::Timestream::ScheduledQuery",
    "AWS::MWAA::Environment",
    "AWS::Grafana::Workspace",
    "AWS::APS::Workspace",
    "AWS::APS::RuleGroupsNamespace",
    "AWS::Proton::EnvironmentTemplate",
    "AWS::Proton::ServiceTemplate",
    "AWS::ResilienceHub::App",
    "AWS::FIS::ExperimentTemplate",
    "AWS::DevOpsGuru::ResourceCollection",
    "AWS::DRS::ReplicationConfigurationTemplate",
    "AWS::ManagedBlockchain::Member",
    "AWS::ManagedBlockchain::Node",
    "AWS::QLDB::Stream",
    "AWS::ApplicationAutoScaling::ScalingPolicy",
    "AWS::AutoScalingPlans::ScalingPlan",
    "AWS::ApplicationInsights::Application",
    "AWS::ResourceExplorer2::Index",
    "AWS::ResourceExplorer2::View",
    "AWS::SSM::Document",
    "AWS::SSM::Association",
    "AWS::SSM::MaintenanceWindow",
    "AWS::SSM::PatchBaseline",
    "AWS::SSMIncidents::ResponsePlan",
    "AWS::SSMContacts::Contact",
    "AWS::InspectorV2::Filter",
];

/// Resource types enumerated in exactly one (designated) region rather than once per region.
/// Follows AWS's own convention: IAM, Route53, CloudFront, Organizations, Budgets, and a
/// handful of other control-plane services are global.
static GLOBAL_SERVICES: &[&str] = &[
    "IAM",
    "Route53",
    "Route53Resolver",
    "Route53RecoveryControl",
    "CloudFront",
    "Organizations",
    "Budgets",
    "WAF",
    "SSO",
    "IdentityStore",
    "ACMPCA",
];

/// Region used as the designated home for global-service work items.
pub const GLOBAL_SERVICE_REGION: &str = "us-east-1";

/// Extracts the service token (second `::`-separated segment) from a resource type name, e.g.
/// `AWS::S3::Bucket` -> `S3`. Used both for the [`ClientKey`](crate::work_item::ClientKey) and
/// for the global-service predicate.
pub fn service_name(resource_type: &str) -> &str {
    resource_type.split("::").nth(1).unwrap_or(resource_type)
}

/// Pure predicate: is this resource type a global service, i.e. does it contribute exactly one
/// expected key (region fixed to [`GLOBAL_SERVICE_REGION`]) rather than one per region?
pub fn is_global_service(resource_type: &str) -> bool {
    GLOBAL_SERVICES.contains(&service_name(resource_type))
}

/// Intersects the static registry with a user-supplied filter. `["all"]`, an empty filter, or a
/// filter containing only unknown types all fall back to the full supported list; unknown
/// requested types are warned about individually but never fail the run.
pub fn filtered_resource_types(requested: &[String]) -> Vec<&'static str> {
    if requested.is_empty() || requested.iter().any(|t| t.eq_ignore_ascii_case("all")) {
        return SUPPORTED_RESOURCE_TYPES.to_vec();
    }

    let mut filtered = Vec::with_capacity(requested.len());
    for wanted in requested {
        match SUPPORTED_RESOURCE_TYPES.iter().find(|t| t.eq_ignore_ascii_case(wanted)) {
            Some(known) => filtered.push(*known),
            None => warn!(resource_type = %wanted, "unknown resource type requested, ignoring"),
        }
    }

    if filtered.is_empty() {
        warn!("resource-type filter matched nothing known, falling back to the full registry");
        return SUPPORTED_RESOURCE_TYPES.to_vec();
    }

    filtered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_service_name_from_resource_type() {
        assert_eq!(service_name("AWS::S3::Bucket"), "S3");
        assert_eq!(service_name("AWS::EC2::Instance"), "EC2");
    }

    #[test]
    fn iam_user_is_global() {
        assert!(is_global_service("AWS::IAM::User"));
        assert!(!is_global_service("AWS::S3::Bucket"));
    }

    #[test]
    fn all_filter_returns_full_registry() {
        let filtered = filtered_resource_types(&["all".to_string()]);
        assert_eq!(filtered.len(), SUPPORTED_RESOURCE_TYPES.len());
    }

    #[test]
    fn empty_filter_falls_back_to_all() {
        let filtered = filtered_resource_types(&[]);
        assert_eq!(filtered.len(), SUPPORTED_RESOURCE_TYPES.len());
    }

    #[test]
    fn unknown_types_are_dropped_not_fatal() {
        let filtered = filtered_resource_types(&[
            "AWS::S3::Bucket".to_string(),
            "AWS::Bogus::Thing".to_string(),
        ]);
        assert_eq!(filtered, vec!["AWS::S3::Bucket"]);
    }

    #[test]
    fn registry_has_no_duplicate_entries() {
        let mut sorted = SUPPORTED_RESOURCE_TYPES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), SUPPORTED_RESOURCE_TYPES.len());
    }
}
