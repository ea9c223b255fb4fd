//! Parameter names, environment keys and fixed limits shared across the crate.

// Descriptor-level system parameters
pub const ORG: &str = "org";
pub const SPACE: &str = "space";
pub const USER: &str = "user";
pub const DEFAULT_DOMAIN: &str = "default-domain";
pub const DEFAULT_IDLE_DOMAIN: &str = "default-idle-domain";
pub const CONTROLLER_URL: &str = "controller-url";
pub const AUTHORIZATION_URL: &str = "authorization-url";
pub const DEPLOY_SERVICE_URL: &str = "deploy-url";
pub const PROTOCOL: &str = "protocol";
pub const TIMESTAMP: &str = "timestamp";
pub const ENABLE_PARALLEL_DEPLOYMENTS: &str = "enable-parallel-deployments";
pub const KEEP_EXISTING_ROUTES: &str = "keep-existing-routes";

// Module parameters
pub const APP_NAME: &str = "app-name";
pub const DEFAULT_APP_NAME: &str = "default-app-name";
pub const HOST: &str = "host";
pub const HOSTS: &str = "hosts";
pub const DOMAIN: &str = "domain";
pub const DOMAINS: &str = "domains";
pub const PORT: &str = "port";
pub const PORTS: &str = "ports";
pub const DEFAULT_HOST: &str = "default-host";
pub const DEFAULT_PORT: &str = "default-port";
pub const IDLE_HOST: &str = "idle-host";
pub const IDLE_HOSTS: &str = "idle-hosts";
pub const IDLE_DOMAIN: &str = "idle-domain";
pub const IDLE_DOMAINS: &str = "idle-domains";
pub const IDLE_PORT: &str = "idle-port";
pub const IDLE_PORTS: &str = "idle-ports";
pub const DEFAULT_IDLE_HOST: &str = "default-idle-host";
pub const DEFAULT_IDLE_PORT: &str = "default-idle-port";
pub const ROUTE: &str = "route";
pub const ROUTES: &str = "routes";
pub const IDLE_ROUTE: &str = "idle-route";
pub const IDLE_ROUTES: &str = "idle-routes";
pub const ROUTE_PATH: &str = "route-path";
pub const NO_ROUTE: &str = "no-route";
pub const NO_HOSTNAME: &str = "no-hostname";
pub const TCP: &str = "tcp";
pub const TCPS: &str = "tcps";
pub const DEFAULT_URI: &str = "default-uri";
pub const DEFAULT_IDLE_URI: &str = "default-idle-uri";
pub const COMMAND: &str = "command";
pub const BUILDPACK: &str = "buildpack";
pub const BUILDPACKS: &str = "buildpacks";
pub const STACK: &str = "stack";
pub const HEALTH_CHECK_TYPE: &str = "health-check-type";
pub const HEALTH_CHECK_TIMEOUT: &str = "health-check-timeout";
pub const HEALTH_CHECK_INVOCATION_TIMEOUT: &str = "health-check-invocation-timeout";
pub const HEALTH_CHECK_HTTP_ENDPOINT: &str = "health-check-http-endpoint";
pub const ENABLE_SSH: &str = "enable-ssh";
pub const LIFECYCLE: &str = "lifecycle";
pub const DOCKER: &str = "docker";
pub const DISK_QUOTA: &str = "disk-quota";
pub const MEMORY: &str = "memory";
pub const INSTANCES: &str = "instances";
pub const DEFAULT_INSTANCES: &str = "default-instances";
pub const TASKS: &str = "tasks";
pub const RESTART_ON_ENV_CHANGE: &str = "restart-on-env-change";
pub const VCAP_APPLICATION_ENV: &str = "vcap-application";
pub const VCAP_SERVICES_ENV: &str = "vcap-services";
pub const USER_PROVIDED_ENV: &str = "user-provided";
pub const DEPLOYED_AFTER: &str = "deployed-after";
pub const TYPE: &str = "type";
pub const CONTAINER_IMAGE: &str = "container-image";
pub const RETRIES: &str = "retries";

// Application attributes exposed through DEPLOY_ATTRIBUTES
pub const EXECUTE_APP: &str = "execute-app";
pub const SUCCESS_MARKER: &str = "success-marker";
pub const FAILURE_MARKER: &str = "failure-marker";
pub const STOP_APP: &str = "stop-app";
pub const CHECK_DEPLOY_ID: &str = "check-deploy-id";
pub const REGISTER_SERVICE_URL: &str = "register-service-url";
pub const REGISTER_SERVICE_URL_SERVICE_NAME: &str = "service-name";
pub const REGISTER_SERVICE_URL_SERVICE_URL: &str = "service-url";
pub const CREATE_SERVICE_BROKER: &str = "create-service-broker";
pub const SERVICE_BROKER_NAME: &str = "service-broker-name";
pub const SERVICE_BROKER_USERNAME: &str = "service-broker-user";
pub const SERVICE_BROKER_PASSWORD: &str = "service-broker-password";
pub const SERVICE_BROKER_URL: &str = "service-broker-url";
pub const SERVICE_BROKER_SPACE_SCOPED: &str = "service-broker-space-scoped";
pub const DEPENDENCY_TYPE: &str = "dependency-type";
pub const NO_START: &str = "no-start";
pub const UPLOAD_TIMEOUT: &str = "upload-timeout";

// Resource parameters
pub const SERVICE_NAME: &str = "service-name";
pub const DEFAULT_SERVICE_NAME: &str = "default-service-name";
pub const SERVICE: &str = "service";
pub const SERVICE_PLAN: &str = "service-plan";
pub const SERVICE_ALTERNATIVES: &str = "service-alternatives";
pub const SERVICE_PROVIDER: &str = "service-provider";
pub const SERVICE_VERSION: &str = "service-version";
pub const SERVICE_BROKER: &str = "service-broker";
pub const SERVICE_CONFIG: &str = "config";
pub const SERVICE_TAGS: &str = "service-tags";
pub const SERVICE_KEYS: &str = "service-keys";
pub const SERVICE_KEY_NAME: &str = "service-key-name";
pub const SERVICE_KEY_CONFIG: &str = "config";
pub const SYSLOG_DRAIN_URL: &str = "syslog-drain-url";
pub const SKIP_SERVICE_UPDATES: &str = "skip-service-updates";
pub const IGNORE_UPDATE_ERRORS: &str = "ignore-update-errors";
pub const OPTIONAL: &str = "optional";
pub const REGISTRY: &str = "registry";
pub const USERNAME: &str = "username";
pub const PASSWORD: &str = "password";
pub const DATA: &str = "data";
pub const SERVICE_CLASS: &str = "service-class";

// Required-dependency parameters
pub const ENV_VAR_NAME: &str = "env-var-name";
pub const BINDING_PARAMETERS: &str = "config";

// Provided-dependency parameters
pub const VISIBILITY: &str = "visibility";
pub const VISIBILITY_ORG: &str = "org";
pub const VISIBILITY_SPACE: &str = "space";
pub const PROVIDER_NAMESPACE: &str = "namespace";

// Environment keys
pub const ENV_MTA_METADATA: &str = "MTA_METADATA";
pub const ENV_MTA_MODULE_METADATA: &str = "MTA_MODULE_METADATA";
pub const ENV_MTA_MODULE_PUBLIC_PROVIDED_DEPENDENCIES: &str = "MTA_MODULE_PROVIDED_DEPENDENCIES";
pub const ENV_MTA_SERVICES: &str = "MTA_SERVICES";
pub const ENV_DEPLOY_ATTRIBUTES: &str = "DEPLOY_ATTRIBUTES";
pub const ENV_DEPLOY_ID: &str = "DEPLOY_ID";

pub const ATTR_ID: &str = "id";
pub const ATTR_NAME: &str = "name";
pub const ATTR_VERSION: &str = "version";
pub const ATTR_DESCRIPTION: &str = "description";
pub const ATTR_PROVIDER: &str = "provider";
pub const ATTR_COPYRIGHT: &str = "copyright";

// Naming
pub const NAMESPACE_SEPARATOR: &str = "-";
pub const IDLE_SUFFIX: &str = "-idle";
pub const BLUE_SUFFIX: &str = "-blue";
pub const GREEN_SUFFIX: &str = "-green";
pub const SERVICE_NAME_MAX_LENGTH: usize = 50;
pub const APP_NAME_MAX_LENGTH: usize = 1024;
pub const NAME_DIGEST_LEN: usize = 8;

// Configuration entries
pub const PROVIDER_NID: &str = "mta";
pub const PROVIDER_ID_DELIMITER: &str = ":";
pub const TARGET_DELIMITER: &str = " ";
pub const PROVIDER_NAMESPACE_DEFAULT: &str = "default";
pub const ANY_TARGET: &str = "*";

/// Application attributes copied into `DEPLOY_ATTRIBUTES`.
pub const APP_ATTRIBUTES: &[&str] = &[
  EXECUTE_APP,
  SUCCESS_MARKER,
  FAILURE_MARKER,
  STOP_APP,
  CHECK_DEPLOY_ID,
  REGISTER_SERVICE_URL,
  REGISTER_SERVICE_URL_SERVICE_NAME,
  REGISTER_SERVICE_URL_SERVICE_URL,
  CREATE_SERVICE_BROKER,
  SERVICE_BROKER_NAME,
  SERVICE_BROKER_USERNAME,
  SERVICE_BROKER_PASSWORD,
  SERVICE_BROKER_URL,
  SERVICE_BROKER_SPACE_SCOPED,
  DEPENDENCY_TYPE,
  NO_START,
  UPLOAD_TIMEOUT,
];

/// Module parameters consumed by the application model.
pub const APP_PARAMETERS: &[&str] = &[
  APP_NAME,
  DEFAULT_APP_NAME,
  HOST,
  HOSTS,
  DOMAIN,
  DOMAINS,
  PORT,
  PORTS,
  DEFAULT_HOST,
  DEFAULT_PORT,
  DEFAULT_DOMAIN,
  IDLE_HOST,
  IDLE_HOSTS,
  IDLE_DOMAIN,
  IDLE_DOMAINS,
  IDLE_PORT,
  IDLE_PORTS,
  DEFAULT_IDLE_HOST,
  DEFAULT_IDLE_PORT,
  DEFAULT_IDLE_DOMAIN,
  ROUTE,
  ROUTES,
  IDLE_ROUTE,
  IDLE_ROUTES,
  ROUTE_PATH,
  NO_ROUTE,
  NO_HOSTNAME,
  TCP,
  TCPS,
  DEFAULT_URI,
  DEFAULT_IDLE_URI,
  COMMAND,
  BUILDPACK,
  BUILDPACKS,
  STACK,
  HEALTH_CHECK_TYPE,
  HEALTH_CHECK_TIMEOUT,
  HEALTH_CHECK_INVOCATION_TIMEOUT,
  HEALTH_CHECK_HTTP_ENDPOINT,
  ENABLE_SSH,
  LIFECYCLE,
  DOCKER,
  DISK_QUOTA,
  MEMORY,
  INSTANCES,
  DEFAULT_INSTANCES,
  TASKS,
  RESTART_ON_ENV_CHANGE,
  KEEP_EXISTING_ROUTES,
  DEPLOYED_AFTER,
  TYPE,
  CONTAINER_IMAGE,
  RETRIES,
];

/// Resource parameters consumed by the service model.
pub const SERVICE_PARAMETERS: &[&str] = &[
  TYPE,
  SERVICE_NAME,
  DEFAULT_SERVICE_NAME,
  SERVICE,
  SERVICE_PLAN,
  SERVICE_ALTERNATIVES,
  SERVICE_PROVIDER,
  SERVICE_VERSION,
  SERVICE_BROKER,
  SERVICE_CONFIG,
  SERVICE_TAGS,
  SERVICE_KEYS,
  SERVICE_KEY_NAME,
  SYSLOG_DRAIN_URL,
  SKIP_SERVICE_UPDATES,
  IGNORE_UPDATE_ERRORS,
  OPTIONAL,
  REGISTRY,
  USERNAME,
  PASSWORD,
  DATA,
  SERVICE_CLASS,
];

/// Descriptor-level parameters that leak into every scope of a chain.
pub const GLOBAL_PARAMETERS: &[&str] = &[
  ORG,
  SPACE,
  USER,
  DEFAULT_DOMAIN,
  DEFAULT_IDLE_DOMAIN,
  CONTROLLER_URL,
  AUTHORIZATION_URL,
  DEPLOY_SERVICE_URL,
  PROTOCOL,
  TIMESTAMP,
  ENABLE_PARALLEL_DEPLOYMENTS,
  KEEP_EXISTING_ROUTES,
  PROVIDER_NAMESPACE,
];
